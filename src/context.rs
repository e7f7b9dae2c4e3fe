// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared reconciler state.
//!
//! `Context` bundles every capability a reconciler needs: the operator's own
//! client (for `Certificate` CRs, which live in the operator's namespace
//! regardless of which workspace their owning traffic object belongs to),
//! the workspace router (for everything else, which is workspace-scoped),
//! and the DNS/cert/resolver/verifier capability traits. It is cheap to
//! clone — every field is a `Client`, `Arc`, or small `Copy`/`String` value
//! — and is threaded through every `kube::runtime::Controller` as the shared
//! `ctx` argument.

use kube::Client;
use std::sync::Arc;

use crate::cert_provider::{CertProfile, CertProvider};
use crate::crd::DnsZoneRef;
use crate::dns_provider::DNSProvider;
use crate::dns_verifier::DnsVerifier;
use crate::host_resolver::watcher::HostsWatcher;
use crate::host_resolver::HostResolver;
use crate::workspace::WorkspaceClientRouter;

/// Shared state threaded through every reconciler.
#[derive(Clone)]
pub struct Context {
    /// The operator's own client, used for resources that live in the
    /// operator's namespace regardless of the owning object's workspace
    /// (`Certificate` CRs).
    pub client: Client,

    /// Resolves a logical workspace to a client scoped to it. Used for the
    /// traffic objects themselves, their `DNSRecord`s, `DomainVerification`s,
    /// and TLS secret clones — everything workspace-scoped per the data model.
    pub workspace_router: Arc<dyn WorkspaceClientRouter>,

    /// DNS backend capability.
    pub dns_provider: Arc<dyn DNSProvider>,

    /// Provider zones the DNS-record controller publishes to.
    pub dns_zones: Vec<DnsZoneRef>,

    /// TLS certificate backend capability.
    pub cert_provider: Arc<dyn CertProvider>,

    /// Certificate backend profile selected by `--tls-provider`.
    pub tls_provider: CertProfile,

    /// DNS-TXT domain ownership proof capability.
    pub dns_verifier: Arc<dyn DnsVerifier>,

    /// Hostname resolution capability, used both directly by the DNS
    /// sub-reconciler and as the backend of `hosts_watcher`.
    pub host_resolver: Arc<dyn HostResolver>,

    /// Background watcher re-resolving admitted load-balancer hostnames.
    pub hosts_watcher: Arc<HostsWatcher>,

    /// Parent domain under which managed hosts are generated.
    pub domain: String,

    /// Whether the host sub-reconciler honors customer-supplied hostnames.
    pub custom_hosts_enabled: bool,

    /// Namespace, in the operator's own client, that `Certificate` CRs are created in.
    pub operator_namespace: String,
}

impl Context {
    /// Assembles a `Context` from its constituent capabilities.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        client: Client,
        workspace_router: Arc<dyn WorkspaceClientRouter>,
        dns_provider: Arc<dyn DNSProvider>,
        dns_zones: Vec<DnsZoneRef>,
        cert_provider: Arc<dyn CertProvider>,
        tls_provider: CertProfile,
        dns_verifier: Arc<dyn DnsVerifier>,
        host_resolver: Arc<dyn HostResolver>,
        hosts_watcher: Arc<HostsWatcher>,
        domain: String,
        custom_hosts_enabled: bool,
        operator_namespace: String,
    ) -> Self {
        Self {
            client,
            workspace_router,
            dns_provider,
            dns_zones,
            cert_provider,
            tls_provider,
            dns_verifier,
            host_resolver,
            hosts_watcher,
            domain,
            custom_hosts_enabled,
            operator_namespace,
        }
    }

    /// `true` if no DNS zones were configured, meaning DNS publication is a
    /// deliberate no-op rather than a provider error.
    #[must_use]
    pub fn dns_writes_enabled(&self) -> bool {
        !self.dns_zones.is_empty()
    }
}

/// Builds the composite `workspace|namespace|name` annotation value linking
/// a sibling artifact (DNSRecord, Certificate, Secret) back to its owning
/// traffic object, per spec §3 "Ownership" and §6.
#[must_use]
pub fn owner_key(workspace: &str, namespace: &str, name: &str) -> String {
    format!("{workspace}|{namespace}|{name}")
}

/// Splits a composite owner key back into its `(workspace, namespace, name)` parts.
#[must_use]
pub fn parse_owner_key(key: &str) -> Option<(&str, &str, &str)> {
    let mut parts = key.splitn(3, '|');
    let workspace = parts.next()?;
    let namespace = parts.next()?;
    let name = parts.next()?;
    Some((workspace, namespace, name))
}

#[path = "context_tests.rs"]
#[cfg(test)]
mod context_tests;
