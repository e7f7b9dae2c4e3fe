// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Hosts watcher: periodic re-resolution of watched hostnames with change callbacks.
//!
//! Maintains `(watcher_key, host) -> (ip_set, last_lookup)`. A single
//! background timer re-resolves every registered host on each tick, bounded
//! in concurrency, and invokes a callback with the watcher key whenever the
//! resolved address set differs from the cached one. `StartWatching` is
//! idempotent; `StopWatching` removes one pair, or every pair under a key
//! when the host argument is empty.

use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::host_resolver::HostResolver;

/// Last-known resolution state for one `(watcher_key, host)` pair.
#[derive(Clone, Debug)]
struct HostRecord {
    host: String,
    addrs: BTreeSet<IpAddr>,
    last_lookup: Instant,
}

/// Callback invoked when a watched host's resolved address set changes.
pub type OnChange = Arc<dyn Fn(&str) + Send + Sync>;

/// Periodically re-resolves a set of watched hostnames, grouped by an owner key.
pub struct HostsWatcher {
    resolver: Arc<dyn HostResolver>,
    interval: Duration,
    concurrency: usize,
    records: Mutex<HashMap<String, Vec<HostRecord>>>,
    on_change: Mutex<Option<OnChange>>,
}

impl HostsWatcher {
    #[must_use]
    pub fn new(resolver: Arc<dyn HostResolver>, interval: Duration) -> Self {
        Self {
            resolver,
            interval,
            concurrency: crate::constants::HOSTS_WATCHER_MAX_CONCURRENCY,
            records: Mutex::new(HashMap::new()),
            on_change: Mutex::new(None),
        }
    }

    /// Registers the callback fired when a watched key's address set changes.
    pub fn set_on_change(&self, callback: OnChange) {
        *self.on_change.lock() = Some(callback);
    }

    /// Starts watching `host` under `watcher_key`. Idempotent: re-registering
    /// the same pair is a no-op until the next tick resolves it.
    pub fn start_watching(&self, watcher_key: &str, host: &str) {
        let mut records = self.records.lock();
        let entries = records.entry(watcher_key.to_string()).or_default();
        if entries.iter().any(|r| r.host == host) {
            return;
        }
        entries.push(HostRecord {
            host: host.to_string(),
            addrs: BTreeSet::new(),
            last_lookup: Instant::now(),
        });
    }

    /// Stops watching. An empty `host` removes every pair under `watcher_key`;
    /// otherwise only the matching `(watcher_key, host)` pair is removed.
    pub fn stop_watching(&self, watcher_key: &str, host: &str) {
        let mut records = self.records.lock();
        if host.is_empty() {
            records.remove(watcher_key);
            return;
        }
        if let Some(entries) = records.get_mut(watcher_key) {
            entries.retain(|r| r.host != host);
            if entries.is_empty() {
                records.remove(watcher_key);
            }
        }
    }

    /// Lists the hosts currently watched under `watcher_key`.
    #[must_use]
    pub fn list_host_record_watchers(&self, watcher_key: &str) -> Vec<String> {
        self.records
            .lock()
            .get(watcher_key)
            .map(|entries| entries.iter().map(|r| r.host.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of distinct watcher keys currently tracked.
    #[must_use]
    pub fn watched_key_count(&self) -> usize {
        self.records.lock().len()
    }

    /// Re-resolves every watched host once, concurrently bounded, and fires
    /// `on_change` for any watcher key whose resolved set changed.
    pub async fn tick(&self) {
        let snapshot: Vec<(String, String)> = {
            let records = self.records.lock();
            records
                .iter()
                .flat_map(|(key, entries)| {
                    entries
                        .iter()
                        .map(move |r| (key.clone(), r.host.clone()))
                })
                .collect()
        };

        let resolver = &self.resolver;
        let results: Vec<(String, String, Option<BTreeSet<IpAddr>>)> = stream::iter(snapshot)
            .map(|(key, host)| async move {
                match resolver.lookup_ip_addr(&host).await {
                    Ok(addrs) => (key, host, Some(addrs)),
                    Err(e) => {
                        warn!(host = %host, error = %e, "hosts watcher lookup failed");
                        (key, host, None)
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut changed_keys: Vec<String> = Vec::new();
        {
            let mut records = self.records.lock();
            for (key, host, resolved) in results {
                let Some(addrs) = resolved else { continue };
                if let Some(entries) = records.get_mut(&key) {
                    if let Some(record) = entries.iter_mut().find(|r| r.host == host) {
                        if record.addrs != addrs {
                            debug!(watcher_key = %key, host = %host, "host address set changed");
                            changed_keys.push(key.clone());
                        }
                        record.addrs = addrs;
                        record.last_lookup = Instant::now();
                    }
                }
            }
        }

        changed_keys.sort();
        changed_keys.dedup();
        if let Some(callback) = self.on_change.lock().as_ref() {
            for key in changed_keys {
                callback(&key);
            }
        }
    }

    /// Spawns the background tick loop on the current Tokio runtime.
    pub fn spawn(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let watcher = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(watcher.interval);
            loop {
                ticker.tick().await;
                watcher.tick().await;
            }
        })
    }
}

#[path = "watcher_tests.rs"]
#[cfg(test)]
mod watcher_tests;
