// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Host resolution capability.
//!
//! Resolves a hostname (typically a load-balancer hostname observed on a
//! traffic object's status) to the set of IP addresses it currently answers
//! on. Pluggable so tests can supply a fixed mapping instead of touching a
//! real resolver.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;

use crate::errors::GlbcError;

pub mod watcher;

/// Resolves a hostname to its current IP address set.
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Looks up all addresses a hostname currently resolves to.
    ///
    /// # Errors
    ///
    /// Returns [`GlbcError::Resolution`] if the lookup fails or the name has no records.
    async fn lookup_ip_addr(&self, host: &str) -> Result<BTreeSet<IpAddr>, GlbcError>;
}

/// Resolves hostnames with the system's configured DNS resolver.
///
/// Selected when the `HOST_RESOLVER` environment variable is unset or
/// `default`, per the external-interfaces contract.
pub struct DefaultHostResolver;

#[async_trait]
impl HostResolver for DefaultHostResolver {
    async fn lookup_ip_addr(&self, host: &str) -> Result<BTreeSet<IpAddr>, GlbcError> {
        let addrs = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|e| GlbcError::Resolution(format!("{host}: {e}")))?;
        let ips: BTreeSet<IpAddr> = addrs.map(|a| a.ip()).collect();
        if ips.is_empty() {
            return Err(GlbcError::Resolution(format!("{host}: no records found")));
        }
        Ok(ips)
    }
}

/// Test double selected by `HOST_RESOLVER=e2e-mock`: resolves every lookup
/// to the same fixed address so e2e environments without real DNS can still
/// exercise the DNS sub-reconciler.
pub struct MockHostResolver {
    fixed: BTreeSet<IpAddr>,
}

impl MockHostResolver {
    #[must_use]
    pub fn new(fixed: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            fixed: fixed.into_iter().collect(),
        }
    }
}

#[async_trait]
impl HostResolver for MockHostResolver {
    async fn lookup_ip_addr(&self, _host: &str) -> Result<BTreeSet<IpAddr>, GlbcError> {
        Ok(self.fixed.clone())
    }
}

/// Selects a [`HostResolver`] implementation from the `HOST_RESOLVER` environment variable.
#[must_use]
pub fn resolver_from_env() -> Arc<dyn HostResolver> {
    match std::env::var("HOST_RESOLVER").as_deref() {
        Ok("e2e-mock") => Arc::new(MockHostResolver::new([IpAddr::from([127, 0, 0, 1])])),
        _ => Arc::new(DefaultHostResolver),
    }
}

#[path = "host_resolver_tests.rs"]
#[cfg(test)]
mod host_resolver_tests;
