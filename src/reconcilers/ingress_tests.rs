// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for ingress.rs

#[cfg(test)]
mod tests {
    use super::super::*;
    use k8s_openapi::api::networking::v1::{
        HTTPIngressPath, HTTPIngressRuleValue, IngressBackend, IngressLoadBalancerIngress,
        IngressLoadBalancerStatus, IngressServiceBackend, IngressSpec, IngressStatus, ServiceBackendPort,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn backend(service: &str) -> IngressBackend {
        IngressBackend {
            service: Some(IngressServiceBackend {
                name: service.to_string(),
                port: Some(ServiceBackendPort {
                    number: Some(8080),
                    name: None,
                }),
            }),
            resource: None,
        }
    }

    fn http_rule(service: &str) -> HTTPIngressRuleValue {
        HTTPIngressRuleValue {
            paths: vec![HTTPIngressPath {
                path: Some("/".to_string()),
                path_type: "Prefix".to_string(),
                backend: backend(service),
            }],
        }
    }

    fn sample_ingress() -> Ingress {
        Ingress {
            metadata: ObjectMeta {
                name: Some("my-ingress".to_string()),
                namespace: Some("default".to_string()),
                uid: Some("uid-1".to_string()),
                ..Default::default()
            },
            spec: Some(IngressSpec {
                rules: Some(vec![IngressRule {
                    host: Some("app.customer.com".to_string()),
                    http: Some(http_rule("my-service")),
                }]),
                tls: None,
                ..Default::default()
            }),
            status: None,
        }
    }

    #[test]
    fn test_workspace_defaults_to_root_without_annotation() {
        let obj = IngressObject::new(sample_ingress());
        assert_eq!(obj.workspace(), "root");
    }

    #[test]
    fn test_workspace_reads_annotation_when_present() {
        let mut ingress = sample_ingress();
        ingress
            .metadata
            .annotations
            .get_or_insert_with(Default::default)
            .insert(crate::labels::WORKSPACE_ANNOTATION.to_string(), "tenant-a".to_string());
        let obj = IngressObject::new(ingress);
        assert_eq!(obj.workspace(), "tenant-a");
    }

    #[test]
    fn test_rules_round_trip_preserves_host_and_backend() {
        let mut obj = IngressObject::new(sample_ingress());
        let rules = obj.rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].host, "app.customer.com");

        obj.set_rules(rules.clone());
        let round_tripped = obj.rules();
        assert_eq!(round_tripped, rules);
    }

    #[test]
    fn test_set_rules_omits_empty_host() {
        let mut obj = IngressObject::new(sample_ingress());
        obj.set_rules(vec![TrafficRule {
            host: String::new(),
            backend: serde_json::to_value(http_rule("my-service")).unwrap(),
        }]);
        let ingress = obj.into_inner();
        let rule = &ingress.spec.unwrap().rules.unwrap()[0];
        assert!(rule.host.is_none());
    }

    #[test]
    fn test_tls_entries_flatten_multi_host_secret() {
        let mut ingress = sample_ingress();
        ingress.spec.as_mut().unwrap().tls = Some(vec![k8s_openapi::api::networking::v1::IngressTLS {
            hosts: Some(vec!["a.customer.com".to_string(), "b.customer.com".to_string()]),
            secret_name: Some("shared-tls".to_string()),
        }]);
        let obj = IngressObject::new(ingress);
        let entries = obj.tls_entries();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.secret_name == "shared-tls"));
    }

    #[test]
    fn test_set_tls_entries_groups_by_secret() {
        let mut obj = IngressObject::new(sample_ingress());
        obj.set_tls_entries(vec![
            TlsEntry {
                host: "a.customer.com".to_string(),
                secret_name: "shared-tls".to_string(),
            },
            TlsEntry {
                host: "b.customer.com".to_string(),
                secret_name: "shared-tls".to_string(),
            },
            TlsEntry {
                host: "c.customer.com".to_string(),
                secret_name: "other-tls".to_string(),
            },
        ]);
        let ingress = obj.into_inner();
        let tls = ingress.spec.unwrap().tls.unwrap();
        assert_eq!(tls.len(), 2);
        let shared = tls.iter().find(|t| t.secret_name.as_deref() == Some("shared-tls")).unwrap();
        assert_eq!(shared.hosts.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_lb_hostnames_and_ips_from_status() {
        let mut ingress = sample_ingress();
        ingress.status = Some(IngressStatus {
            load_balancer: Some(IngressLoadBalancerStatus {
                ingress: Some(vec![
                    IngressLoadBalancerIngress {
                        hostname: Some("lb.cloud.example".to_string()),
                        ip: None,
                        ports: None,
                    },
                    IngressLoadBalancerIngress {
                        hostname: None,
                        ip: Some("10.0.0.5".to_string()),
                        ports: None,
                    },
                ]),
            }),
        });
        let obj = IngressObject::new(ingress);
        assert_eq!(obj.lb_hostnames(), vec!["lb.cloud.example".to_string()]);
        assert_eq!(obj.lb_ips(), vec!["10.0.0.5".to_string()]);
    }

    #[test]
    fn test_lb_hostnames_empty_without_status() {
        let obj = IngressObject::new(sample_ingress());
        assert!(obj.lb_hostnames().is_empty());
        assert!(obj.lb_ips().is_empty());
    }

    #[test]
    fn test_annotation_round_trip() {
        let mut obj = IngressObject::new(sample_ingress());
        assert_eq!(obj.annotation("kuadrant.dev/managed-host"), None);
        obj.set_annotation("kuadrant.dev/managed-host", "abc.example.test".to_string());
        assert_eq!(
            obj.annotation("kuadrant.dev/managed-host"),
            Some("abc.example.test".to_string())
        );
        obj.remove_annotation("kuadrant.dev/managed-host");
        assert_eq!(obj.annotation("kuadrant.dev/managed-host"), None);
    }

    #[test]
    fn test_group_tls_by_secret_preserves_order() {
        let grouped = group_tls_by_secret(vec![
            TlsEntry {
                host: "a".to_string(),
                secret_name: "s1".to_string(),
            },
            TlsEntry {
                host: "b".to_string(),
                secret_name: "s2".to_string(),
            },
            TlsEntry {
                host: "c".to_string(),
                secret_name: "s1".to_string(),
            },
        ]);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0], ("s1".to_string(), vec!["a".to_string(), "c".to_string()]));
        assert_eq!(grouped[1], ("s2".to_string(), vec!["b".to_string()]));
    }
}
