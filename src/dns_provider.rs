// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS provider capability.
//!
//! Ensures or deletes a `DNSRecord`'s published state in one configured
//! zone. The DNS-record controller (`reconcilers::dnsrecord`) calls through
//! this trait once per zone per reconcile; the cloud-provider SDK details
//! are entirely behind it.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::crd::{DNSRecordSpec, DnsZoneRef};
use crate::errors::GlbcError;

/// Ensures and removes published DNS state for one zone.
#[async_trait]
pub trait DNSProvider: Send + Sync {
    /// Upserts every endpoint in `record` into `zone`. Must be idempotent:
    /// calling `ensure` twice with the same input leaves provider state
    /// byte-identical to calling it once.
    ///
    /// # Errors
    ///
    /// Returns [`GlbcError::Provider`] on authentication failure, invalid
    /// zone, or a transport error talking to the backend.
    async fn ensure(&self, record: &DNSRecordSpec, zone: &DnsZoneRef) -> Result<(), GlbcError>;

    /// Removes every endpoint in `record` from `zone`. A zone that never had
    /// the record published is a success, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`GlbcError::Provider`] on the same conditions as [`DNSProvider::ensure`].
    async fn delete(&self, record: &DNSRecordSpec, zone: &DnsZoneRef) -> Result<(), GlbcError>;

    /// Human-readable provider name used in metric labels and log fields.
    fn name(&self) -> &'static str;
}

/// In-memory provider used by tests and the `dns-provider=fake` CLI profile.
///
/// Tracks published records per zone so assertions and the delete path can
/// observe provider-side state without any network access.
#[derive(Default)]
pub struct FakeDnsProvider {
    published: Mutex<HashMap<String, DNSRecordSpec>>,
}

impl FakeDnsProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(zone: &DnsZoneRef, record: &DNSRecordSpec) -> String {
        format!("{}/{}", zone.id, record.dns_name)
    }

    /// Returns true if `record` is currently published to `zone` in this fake's memory.
    #[must_use]
    pub fn is_published(&self, record: &DNSRecordSpec, zone: &DnsZoneRef) -> bool {
        self.published.lock().contains_key(&Self::key(zone, record))
    }
}

#[async_trait]
impl DNSProvider for FakeDnsProvider {
    async fn ensure(&self, record: &DNSRecordSpec, zone: &DnsZoneRef) -> Result<(), GlbcError> {
        self.published
            .lock()
            .insert(Self::key(zone, record), record.clone());
        Ok(())
    }

    async fn delete(&self, record: &DNSRecordSpec, zone: &DnsZoneRef) -> Result<(), GlbcError> {
        self.published.lock().remove(&Self::key(zone, record));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// A provider wrapper that forces the next `count` `ensure` calls to fail,
/// used to exercise the DNS-record controller's provider-error retry path
/// (spec scenario: "provider.Ensure returns quota exceeded twice then succeeds").
pub struct FlakyDnsProvider {
    inner: FakeDnsProvider,
    remaining_failures: Mutex<u32>,
}

impl FlakyDnsProvider {
    #[must_use]
    pub fn new(failures: u32) -> Self {
        Self {
            inner: FakeDnsProvider::new(),
            remaining_failures: Mutex::new(failures),
        }
    }
}

#[async_trait]
impl DNSProvider for FlakyDnsProvider {
    async fn ensure(&self, record: &DNSRecordSpec, zone: &DnsZoneRef) -> Result<(), GlbcError> {
        let mut remaining = self.remaining_failures.lock();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(GlbcError::Provider {
                provider: "dns",
                message: "quota exceeded".to_string(),
            });
        }
        drop(remaining);
        self.inner.ensure(record, zone).await
    }

    async fn delete(&self, record: &DNSRecordSpec, zone: &DnsZoneRef) -> Result<(), GlbcError> {
        self.inner.delete(record, zone).await
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[path = "dns_provider_tests.rs"]
#[cfg(test)]
mod dns_provider_tests;
