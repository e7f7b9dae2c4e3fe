// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Process configuration: CLI flags and their environment-variable fallbacks.
//!
//! Every flag here is env-overridable per the external-interfaces contract;
//! `clap`'s `env` attribute gives each field both a flag and an environment
//! variable for free, layering `clap` derive over environment-driven
//! defaults.

use clap::{Parser, ValueEnum};

use crate::cert_provider::CertProfile as CertProfileImpl;

/// Selects the TLS certificate backend profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum TlsProvider {
    GlbcCa,
    LeStaging,
    LeProduction,
}

impl TlsProvider {
    #[must_use]
    pub fn as_cert_profile(self) -> CertProfileImpl {
        match self {
            Self::GlbcCa => CertProfileImpl::GlbcCa,
            Self::LeStaging => CertProfileImpl::LeStaging,
            Self::LeProduction => CertProfileImpl::LeProduction,
        }
    }
}

/// Selects the DNS provider backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum DnsProviderKind {
    Aws,
    Fake,
}

/// GLBC: Global Load Balancer Controller.
///
/// Issues managed public hostnames for traffic objects (Ingress, Route)
/// scattered across logical workspaces, publishes DNS records, proves
/// ownership of customer-supplied custom hostnames, and provisions TLS
/// certificates.
#[derive(Parser, Debug, Clone)]
#[command(name = "glbc", version, about)]
pub struct Cli {
    /// TLS certificate backend profile.
    #[arg(long, env = "TLS_PROVIDER", value_enum, default_value = "glbc-ca")]
    pub tls_provider: TlsProvider,

    /// Parent domain under which managed hosts are generated, e.g. `example.test`.
    #[arg(long, env = "DOMAIN")]
    pub domain: String,

    /// DNS provider backend.
    #[arg(long, env = "DNS_PROVIDER", value_enum, default_value = "fake")]
    pub dns_provider: DnsProviderKind,

    /// Cloud region for the DNS backend.
    #[arg(long, env = "REGION", default_value = "")]
    pub region: String,

    /// Metrics HTTP port. `0` disables the metrics server.
    #[arg(long, env = "MONITORING_PORT", default_value_t = 8080)]
    pub monitoring_port: u16,

    /// Comma-separated list of DNS provider zone ids the DNS-record
    /// controller publishes to.
    #[arg(long, env = "DNS_ZONES", value_delimiter = ',')]
    pub dns_zones: Vec<String>,

    /// Enable custom-hostname support in the host sub-reconciler.
    #[arg(long, env = "CUSTOM_HOSTS_ENABLED", default_value_t = true)]
    pub custom_hosts_enabled: bool,

    /// Number of concurrent reconciles per controller ("N workers").
    #[arg(long, env = "CONTROLLER_WORKERS", default_value_t = crate::constants::DEFAULT_CONTROLLER_WORKERS)]
    pub controller_workers: u16,
}

impl Cli {
    /// Parses CLI flags, falling back to environment variables per field.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// `true` if no DNS zones were configured, meaning DNS writes are disabled
    /// (mirrors the `AWS_DNS_PUBLIC_ZONE_ID` absence contract in spec §6).
    #[must_use]
    pub fn dns_writes_enabled(&self) -> bool {
        !self.dns_zones.is_empty()
    }
}

#[path = "config_tests.rs"]
#[cfg(test)]
mod config_tests;
