// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Certificate provider capability.
//!
//! Creates, updates, and deletes managed certificates and exposes the
//! issued TLS secret bytes once a certificate is ready. The certificate
//! sub-reconciler (`reconcilers::traffic::certificate`) drives one
//! `Certificate` CR per traffic object through this trait; the ACME/CA
//! backend details live entirely behind it.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

use crate::errors::GlbcError;

/// Issued TLS secret bytes for a ready certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedSecret {
    pub tls_crt: Vec<u8>,
    pub tls_key: Vec<u8>,
}

/// Cert backend profile selected by `--tls-provider`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CertProfile {
    GlbcCa,
    LeStaging,
    LeProduction,
}

impl CertProfile {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GlbcCa => "glbc-ca",
            Self::LeStaging => "le-staging",
            Self::LeProduction => "le-production",
        }
    }

    #[must_use]
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "glbc-ca" => Some(Self::GlbcCa),
            "le-staging" => Some(Self::LeStaging),
            "le-production" => Some(Self::LeProduction),
            _ => None,
        }
    }
}

/// Creates, updates, and deletes managed certificates for a set of hosts.
#[async_trait]
pub trait CertProvider: Send + Sync {
    /// Requests a new certificate covering `hosts`, identified by `name`.
    ///
    /// # Errors
    ///
    /// Returns [`GlbcError::Provider`] if the backend rejects the request.
    async fn create(&self, name: &str, hosts: &[String]) -> Result<(), GlbcError>;

    /// Updates the host set of an existing certificate, triggering re-issuance.
    ///
    /// # Errors
    ///
    /// Returns [`GlbcError::Provider`] if the backend rejects the update, or
    /// [`GlbcError::NotFound`] if `name` has no certificate.
    async fn update(&self, name: &str, hosts: &[String]) -> Result<(), GlbcError>;

    /// Deletes a certificate and, when the backend owns it, its secret.
    ///
    /// # Errors
    ///
    /// Returns [`GlbcError::Provider`] if the backend rejects the deletion.
    async fn delete(&self, name: &str) -> Result<(), GlbcError>;

    /// Returns `true` once the backend reports the certificate ready (secret populated).
    ///
    /// # Errors
    ///
    /// Returns [`GlbcError::NotFound`] if `name` has no certificate.
    async fn get_certificate_status(&self, name: &str) -> Result<bool, GlbcError>;

    /// Fetches the issued secret bytes. Must only be called once
    /// [`CertProvider::get_certificate_status`] reports ready.
    ///
    /// # Errors
    ///
    /// Returns [`GlbcError::SideInputNotFound`] if the certificate is not yet ready.
    async fn get_certificate_secret(&self, name: &str) -> Result<IssuedSecret, GlbcError>;
}

/// In-memory provider used by tests and the `glbc-ca` CLI profile's test double.
///
/// Certificates become ready immediately on creation; a name can be put into
/// a deliberately-pending state via [`FakeCertProvider::hold_pending`] to
/// exercise the "Certificate not yet ready" transition.
#[derive(Default)]
pub struct FakeCertProvider {
    hosts: Mutex<HashMap<String, Vec<String>>>,
    pending: Mutex<HashSet<String>>,
}

impl FakeCertProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `name` as perpetually pending until [`FakeCertProvider::release`] is called.
    pub fn hold_pending(&self, name: &str) {
        self.pending.lock().insert(name.to_string());
    }

    /// Releases a name held pending by [`FakeCertProvider::hold_pending`].
    pub fn release(&self, name: &str) {
        self.pending.lock().remove(name);
    }
}

#[async_trait]
impl CertProvider for FakeCertProvider {
    async fn create(&self, name: &str, hosts: &[String]) -> Result<(), GlbcError> {
        self.hosts
            .lock()
            .insert(name.to_string(), hosts.to_vec());
        Ok(())
    }

    async fn update(&self, name: &str, hosts: &[String]) -> Result<(), GlbcError> {
        let mut map = self.hosts.lock();
        let entry = map
            .get_mut(name)
            .ok_or_else(|| GlbcError::NotFound(name.to_string()))?;
        *entry = hosts.to_vec();
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), GlbcError> {
        self.hosts.lock().remove(name);
        self.pending.lock().remove(name);
        Ok(())
    }

    async fn get_certificate_status(&self, name: &str) -> Result<bool, GlbcError> {
        if !self.hosts.lock().contains_key(name) {
            return Err(GlbcError::NotFound(name.to_string()));
        }
        Ok(!self.pending.lock().contains(name))
    }

    async fn get_certificate_secret(&self, name: &str) -> Result<IssuedSecret, GlbcError> {
        if self.pending.lock().contains(name) {
            return Err(GlbcError::SideInputNotFound(format!(
                "certificate {name} not ready"
            )));
        }
        if !self.hosts.lock().contains_key(name) {
            return Err(GlbcError::NotFound(name.to_string()));
        }
        Ok(IssuedSecret {
            tls_crt: b"fake-cert".to_vec(),
            tls_key: b"fake-key".to_vec(),
        })
    }
}

#[path = "cert_provider_tests.rs"]
#[cfg(test)]
mod cert_provider_tests;
