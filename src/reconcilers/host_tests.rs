// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for host.rs

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::crd::{DomainVerification, DomainVerificationSpec, DomainVerificationStatus};
    use std::collections::HashMap;

    /// In-memory `TrafficObject` double, shared by the sub-reconciler unit tests.
    #[derive(Default)]
    struct FakeTrafficObject {
        annotations: HashMap<String, String>,
        rules: Vec<TrafficRule>,
        tls: Vec<TlsEntry>,
        deleting: bool,
    }

    impl TrafficObject for FakeTrafficObject {
        fn kind(&self) -> &'static str {
            "FakeTraffic"
        }
        fn workspace(&self) -> String {
            "root".to_string()
        }
        fn namespace(&self) -> String {
            "default".to_string()
        }
        fn name(&self) -> String {
            "fake".to_string()
        }
        fn uid(&self) -> String {
            "fake-uid".to_string()
        }
        fn is_deleting(&self) -> bool {
            self.deleting
        }
        fn annotation(&self, key: &str) -> Option<String> {
            self.annotations.get(key).cloned()
        }
        fn set_annotation(&mut self, key: &str, value: String) {
            self.annotations.insert(key.to_string(), value);
        }
        fn remove_annotation(&mut self, key: &str) {
            self.annotations.remove(key);
        }
        fn finalizers(&self) -> Vec<String> {
            Vec::new()
        }
        fn rules(&self) -> Vec<TrafficRule> {
            self.rules.clone()
        }
        fn set_rules(&mut self, rules: Vec<TrafficRule>) {
            self.rules = rules;
        }
        fn tls_entries(&self) -> Vec<TlsEntry> {
            self.tls.clone()
        }
        fn set_tls_entries(&mut self, entries: Vec<TlsEntry>) {
            self.tls = entries;
        }
        fn lb_hostnames(&self) -> Vec<String> {
            Vec::new()
        }
        fn lb_ips(&self) -> Vec<String> {
            Vec::new()
        }
    }

    fn rule(host: &str) -> TrafficRule {
        TrafficRule {
            host: host.to_string(),
            backend: serde_json::json!({"service": "svc"}),
        }
    }

    fn verified_dv(domain: &str) -> DomainVerification {
        let mut dv = DomainVerification::new(
            &domain.replace('.', "-"),
            DomainVerificationSpec {
                domain: domain.to_string(),
            },
        );
        dv.status = Some(DomainVerificationStatus {
            verified: true,
            ..Default::default()
        });
        dv
    }

    fn unverified_dv(domain: &str) -> DomainVerification {
        DomainVerification::new(
            &domain.replace('.', "-"),
            DomainVerificationSpec {
                domain: domain.to_string(),
            },
        )
    }

    #[test]
    fn test_host_matches_direct_parent() {
        assert!(host_matches("app.customer.com", "customer.com"));
    }

    #[test]
    fn test_host_matches_multi_level() {
        assert!(host_matches("a.b.customer.com", "customer.com"));
    }

    #[test]
    fn test_host_matches_rejects_unrelated_domain() {
        assert!(!host_matches("app.other.com", "customer.com"));
    }

    #[test]
    fn test_host_matches_rejects_bare_host() {
        assert!(!host_matches("customer", "customer.com"));
    }

    #[tokio::test]
    async fn test_first_pass_assigns_managed_host_and_stops() {
        let mut obj = FakeTrafficObject::default();
        let (signal, delay) = apply("example.test", true, &mut obj, &[]).unwrap();
        assert_eq!(signal, ChainSignal::Stop);
        assert_eq!(delay, None);
        let host = obj.annotation(MANAGED_HOST_ANNOTATION).unwrap();
        assert!(host.ends_with(".example.test"));
        assert_eq!(host.len(), UID_LENGTH + ".example.test".len());
    }

    #[tokio::test]
    async fn test_second_pass_with_no_custom_hosts_is_a_noop_continue() {
        let mut obj = FakeTrafficObject::default();
        obj.set_annotation(MANAGED_HOST_ANNOTATION, "abc.example.test".to_string());
        obj.set_rules(vec![rule("abc.example.test")]);

        let (signal, _) = apply("example.test", true, &mut obj, &[]).unwrap();
        assert_eq!(signal, ChainSignal::Continue);
        assert_eq!(obj.rules(), vec![rule("abc.example.test")]);
    }

    #[tokio::test]
    async fn test_unverified_custom_host_gets_only_generated_twin() {
        let mut obj = FakeTrafficObject::default();
        obj.set_annotation(MANAGED_HOST_ANNOTATION, "abc.example.test".to_string());
        obj.set_rules(vec![rule("app.customer.com")]);
        obj.set_tls_entries(vec![TlsEntry {
            host: "app.customer.com".to_string(),
            secret_name: "customer-tls".to_string(),
        }]);

        let dvs = vec![unverified_dv("customer.com")];
        let (signal, _) = apply("example.test", true, &mut obj, &dvs).unwrap();
        assert_eq!(signal, ChainSignal::Continue);

        let hosts: Vec<String> = obj.rules().into_iter().map(|r| r.host).collect();
        assert_eq!(hosts, vec!["abc.example.test".to_string()]);
        // TLS entry for the still-unverified custom host is stripped.
        assert!(obj.tls_entries().is_empty());

        let generated: std::collections::BTreeMap<String, usize> =
            serde_json::from_str(&obj.annotation(GENERATED_RULES_ANNOTATION).unwrap()).unwrap();
        assert_eq!(generated.get("app.customer.com"), Some(&0));
    }

    #[tokio::test]
    async fn test_verified_custom_host_keeps_both_rules() {
        let mut obj = FakeTrafficObject::default();
        obj.set_annotation(MANAGED_HOST_ANNOTATION, "abc.example.test".to_string());
        obj.set_rules(vec![rule("app.customer.com")]);
        obj.set_tls_entries(vec![TlsEntry {
            host: "app.customer.com".to_string(),
            secret_name: "customer-tls".to_string(),
        }]);

        let dvs = vec![verified_dv("customer.com")];
        apply("example.test", true, &mut obj, &dvs).unwrap();

        let mut hosts: Vec<String> = obj.rules().into_iter().map(|r| r.host).collect();
        hosts.sort();
        assert_eq!(
            hosts,
            vec!["abc.example.test".to_string(), "app.customer.com".to_string()]
        );
        assert_eq!(obj.tls_entries().len(), 1);
    }

    #[tokio::test]
    async fn test_host_becomes_verified_on_a_later_pass_restores_rule() {
        let mut obj = FakeTrafficObject::default();
        obj.set_annotation(MANAGED_HOST_ANNOTATION, "abc.example.test".to_string());
        obj.set_rules(vec![rule("app.customer.com")]);

        // First pass: unverified, only the generated twin survives.
        apply("example.test", true, &mut obj, &[unverified_dv("customer.com")]).unwrap();
        assert_eq!(obj.rules().len(), 1);

        // Second pass: now verified, the custom-host rule reappears.
        let dvs = vec![verified_dv("customer.com")];
        apply("example.test", true, &mut obj, &dvs).unwrap();

        let mut hosts: Vec<String> = obj.rules().into_iter().map(|r| r.host).collect();
        hosts.sort();
        assert_eq!(
            hosts,
            vec!["abc.example.test".to_string(), "app.customer.com".to_string()]
        );
    }

    #[tokio::test]
    async fn test_custom_hosts_disabled_rewrites_every_rule_onto_managed_host() {
        let mut obj = FakeTrafficObject::default();
        obj.set_annotation(MANAGED_HOST_ANNOTATION, "abc.example.test".to_string());
        obj.set_rules(vec![rule("app.customer.com"), rule("abc.example.test")]);
        obj.set_tls_entries(vec![TlsEntry {
            host: "app.customer.com".to_string(),
            secret_name: "customer-tls".to_string(),
        }]);

        apply("example.test", false, &mut obj, &[]).unwrap();

        let hosts: Vec<String> = obj.rules().into_iter().map(|r| r.host).collect();
        assert_eq!(
            hosts,
            vec!["abc.example.test".to_string(), "abc.example.test".to_string()]
        );
        assert!(obj.tls_entries().is_empty());
        assert!(obj.annotation(CUSTOM_HOSTS_REPLACED_ANNOTATION).is_some());
    }

    #[test]
    fn test_generated_rules_annotation_is_canonical_json() {
        // BTreeMap serialization sorts keys, so two equivalent states
        // produce byte-identical JSON regardless of insertion order.
        let mut a = FakeTrafficObject::default();
        a.set_rules(vec![rule("b.customer.com"), rule("a.customer.com")]);
        let result_a = process_custom_hosts(&a.rules, &a.tls, "abc.example.test", None, &[]).unwrap();

        let mut b = FakeTrafficObject::default();
        b.set_rules(vec![rule("a.customer.com"), rule("b.customer.com")]);
        let result_b = process_custom_hosts(&b.rules, &b.tls, "abc.example.test", None, &[]).unwrap();

        let parsed_a: std::collections::BTreeMap<String, usize> =
            serde_json::from_str(&result_a.generated_rules_json).unwrap();
        let parsed_b: std::collections::BTreeMap<String, usize> =
            serde_json::from_str(&result_b.generated_rules_json).unwrap();
        assert_eq!(parsed_a.keys().collect::<Vec<_>>(), parsed_b.keys().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_deleting_object_is_left_untouched() {
        let mut obj = FakeTrafficObject::default();
        obj.deleting = true;
        let (signal, delay) = apply("example.test", true, &mut obj, &[]).unwrap();
        assert_eq!(signal, ChainSignal::Continue);
        assert_eq!(delay, None);
        assert!(obj.annotation(MANAGED_HOST_ANNOTATION).is_none());
    }

    #[test]
    fn test_malformed_generated_rules_annotation_is_an_error() {
        let result = process_custom_hosts(&[], &[], "abc.example.test", Some("not json"), &[]);
        assert!(result.is_err());
    }
}
