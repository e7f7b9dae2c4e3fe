// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for dns.rs

#[cfg(test)]
mod tests {
    use super::super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeTrafficObject {
        annotations: HashMap<String, String>,
        rules: Vec<crate::reconcilers::traffic::TrafficRule>,
        tls: Vec<crate::reconcilers::traffic::TlsEntry>,
        deleting: bool,
        lb_ips: Vec<String>,
        lb_hostnames: Vec<String>,
    }

    impl crate::reconcilers::traffic::TrafficObject for FakeTrafficObject {
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
        fn rules(&self) -> Vec<crate::reconcilers::traffic::TrafficRule> {
            self.rules.clone()
        }
        fn set_rules(&mut self, rules: Vec<crate::reconcilers::traffic::TrafficRule>) {
            self.rules = rules;
        }
        fn tls_entries(&self) -> Vec<crate::reconcilers::traffic::TlsEntry> {
            self.tls.clone()
        }
        fn set_tls_entries(&mut self, entries: Vec<crate::reconcilers::traffic::TlsEntry>) {
            self.tls = entries;
        }
        fn lb_hostnames(&self) -> Vec<String> {
            self.lb_hostnames.clone()
        }
        fn lb_ips(&self) -> Vec<String> {
            self.lb_ips.clone()
        }
    }

    #[test]
    fn test_record_name_replaces_dots() {
        assert_eq!(record_name("abc.example.test"), "abc-example-test");
    }

    #[test]
    fn test_assemble_endpoints_empty_when_nothing_admitted() {
        let obj = FakeTrafficObject::default();
        assert!(assemble_endpoints("abc.example.test", &obj).is_empty());
    }

    #[test]
    fn test_assemble_endpoints_prefers_ip_addresses() {
        let mut obj = FakeTrafficObject::default();
        obj.lb_ips = vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()];
        obj.lb_hostnames = vec!["lb.cloud.example".to_string()];

        let endpoints = assemble_endpoints("abc.example.test", &obj);
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].record_type, "A");
        assert_eq!(endpoints[0].targets, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(endpoints[0].dns_name, "abc.example.test");
    }

    #[test]
    fn test_assemble_endpoints_falls_back_to_cname() {
        let mut obj = FakeTrafficObject::default();
        obj.lb_hostnames = vec!["lb.cloud.example".to_string()];

        let endpoints = assemble_endpoints("abc.example.test", &obj);
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].record_type, "CNAME");
        assert_eq!(endpoints[0].targets, vec!["lb.cloud.example"]);
    }
}
