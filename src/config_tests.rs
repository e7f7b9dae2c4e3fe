// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `config.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use clap::Parser;

    #[test]
    fn test_parses_minimal_flags() {
        let cli = Cli::parse_from(["glbc", "--domain", "example.test"]);
        assert_eq!(cli.domain, "example.test");
        assert_eq!(cli.tls_provider, TlsProvider::GlbcCa);
        assert_eq!(cli.dns_provider, DnsProviderKind::Fake);
        assert_eq!(cli.monitoring_port, 8080);
        assert!(cli.dns_zones.is_empty());
        assert!(!cli.dns_writes_enabled());
    }

    #[test]
    fn test_parses_dns_zones_list() {
        let cli = Cli::parse_from([
            "glbc",
            "--domain",
            "example.test",
            "--dns-zones",
            "Z1,Z2,Z3",
        ]);
        assert_eq!(cli.dns_zones, vec!["Z1", "Z2", "Z3"]);
        assert!(cli.dns_writes_enabled());
    }

    #[test]
    fn test_monitoring_port_zero_disables() {
        let cli = Cli::parse_from([
            "glbc",
            "--domain",
            "example.test",
            "--monitoring-port",
            "0",
        ]);
        assert_eq!(cli.monitoring_port, 0);
    }

    #[test]
    fn test_tls_provider_value_enum() {
        let cli = Cli::parse_from([
            "glbc",
            "--domain",
            "example.test",
            "--tls-provider",
            "le-staging",
        ]);
        assert_eq!(cli.tls_provider, TlsProvider::LeStaging);
        assert_eq!(cli.tls_provider.as_cert_profile().as_str(), "le-staging");
    }

    #[test]
    fn test_custom_hosts_enabled_default() {
        let cli = Cli::parse_from(["glbc", "--domain", "example.test"]);
        assert!(cli.custom_hosts_enabled);
    }

    #[test]
    fn test_controller_workers_default() {
        let cli = Cli::parse_from(["glbc", "--domain", "example.test"]);
        assert_eq!(
            cli.controller_workers,
            crate::constants::DEFAULT_CONTROLLER_WORKERS
        );
    }
}
