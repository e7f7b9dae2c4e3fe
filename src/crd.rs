// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for global load balancing.
//!
//! This module defines all Kubernetes Custom Resource Definitions used by GLBC
//! to manage global load balancing declaratively.
//!
//! # Resource Types
//!
//! - [`DNSRecord`] - Desired DNS endpoint state for a managed host, published
//!   across a static list of provider zones.
//! - [`DomainVerification`] - Proof of ownership of a customer-supplied custom
//!   hostname via a DNS-TXT challenge.
//! - [`Certificate`] - A managed TLS certificate covering a traffic object's
//!   managed host and verified custom hosts.
//! - [`Route`] - An OpenShift-style traffic object (host, backing service, TLS)
//!   that participates in the traffic reconciler chain alongside Ingress.
//!
//! # Example: Creating a DNS Record
//!
//! ```rust,no_run
//! use glbc::crd::{DNSRecordSpec, Endpoint};
//!
//! let spec = DNSRecordSpec {
//!     dns_name: "abc123.example.test".to_string(),
//!     endpoints: vec![Endpoint {
//!         dns_name: "abc123.example.test".to_string(),
//!         targets: vec!["10.0.0.1".to_string()],
//!         record_type: "A".to_string(),
//!         record_ttl: 60,
//!         set_identifier: None,
//!     }],
//! };
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition represents an observation of a resource's current state.
///
/// Conditions are used in status subresources to communicate the state of
/// a resource to users and controllers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition, e.g. `DNSRecordFailed`, `Ready`.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

impl Condition {
    /// Builds a new condition stamped with the current transition time.
    #[must_use]
    pub fn new(r#type: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            r#type: r#type.into(),
            status: status.into(),
            reason: None,
            message: None,
            last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Sets the reason and message on this condition.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>, message: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self.message = Some(message.into());
        self
    }

    /// Returns true if `status == "True"`.
    #[must_use]
    pub fn is_true(&self) -> bool {
        self.status == "True"
    }
}

/// A reference to a DNS provider zone, identified by the opaque zone id
/// supplied to the controller via configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DnsZoneRef {
    /// Opaque provider-assigned zone id (e.g. a Route53 hosted zone id).
    pub id: String,

    /// The zone's apex DNS name, for display and logging only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
}

/// One DNS endpoint: a name, the record type, and its resolved targets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// The DNS name this endpoint publishes (equals the managed host).
    pub dns_name: String,

    /// Resolved target addresses or hostnames (A/AAAA addresses, or a CNAME target).
    pub targets: Vec<String>,

    /// Record type, e.g. `A`, `AAAA`, `CNAME`.
    pub record_type: String,

    /// Time-to-live for this record, in seconds.
    pub record_ttl: i64,

    /// Optional identifier distinguishing multiple endpoints sharing the same
    /// `dns_name` (weighted/latency/geo routing policies).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_identifier: Option<String>,
}

/// Per-zone publication status for a `DNSRecord`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DNSZoneStatus {
    /// The zone this status entry describes.
    pub zone: DnsZoneRef,

    /// Conditions for this zone, including `DNSRecordFailed`.
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// The endpoint set most recently published to this zone.
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

/// Condition type recorded for each zone a `DNSRecord` is published to.
pub const DNS_RECORD_FAILED_CONDITION_TYPE: &str = "DNSRecordFailed";

/// `DNSRecordStatus` tracks per-zone publication state.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DNSRecordStatus {
    /// Per-zone publication status, zone-order-preserving.
    #[serde(default)]
    pub zones: Vec<DNSZoneStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

/// `DNSRecord` drives publication of a managed host's endpoints across every
/// configured provider zone.
///
/// # Example
///
/// ```yaml
/// apiVersion: kuadrant.dev/v1
/// kind: DNSRecord
/// metadata:
///   name: abc123-example-test
///   namespace: default
///   annotations:
///     kuadrant.dev/owner-key: "root|default|my-ingress"
/// spec:
///   dnsName: abc123.example.test
///   endpoints:
///     - dnsName: abc123.example.test
///       targets: ["10.0.0.1"]
///       recordType: A
///       recordTTL: 60
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "kuadrant.dev",
    version = "v1",
    kind = "DNSRecord",
    namespaced,
    shortname = "dnsrecord",
    shortname = "dnsrecords",
    doc = "DNSRecord drives publication of a managed host's endpoints across every configured DNS provider zone.",
    printcolumn = r#"{"name":"DNSName","type":"string","jsonPath":".spec.dnsName"}"#
)]
#[kube(status = "DNSRecordStatus")]
#[serde(rename_all = "camelCase")]
pub struct DNSRecordSpec {
    /// The DNS name this record publishes; equals the traffic object's managed host.
    pub dns_name: String,

    /// Desired endpoint set, assembled from the traffic object's admitted
    /// load-balancer addresses.
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

/// `DomainVerificationStatus` tracks the DNS-TXT challenge state machine.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DomainVerificationStatus {
    /// Deterministic challenge token derived from the object's name and uid.
    #[serde(default)]
    pub token: String,

    /// Once `true`, never transitions back to `false` for the same uid.
    #[serde(default)]
    pub verified: bool,

    /// Timestamp of the most recent verification attempt (RFC3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<String>,

    /// Earliest time the next verification attempt may run (RFC3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_check: Option<String>,

    /// Human-readable outcome of the most recent attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `DomainVerification` proves ownership of a customer-supplied custom
/// hostname via a DNS-TXT challenge published under
/// `_kuadrant-verification.<domain>`.
///
/// Cluster-scoped: a domain's verification state is shared by every workspace
/// that references it.
///
/// # Example
///
/// ```yaml
/// apiVersion: kuadrant.dev/v1
/// kind: DomainVerification
/// metadata:
///   name: customer-com
/// spec:
///   domain: customer.com
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "kuadrant.dev",
    version = "v1",
    kind = "DomainVerification",
    shortname = "dv",
    shortname = "domainverifications",
    doc = "DomainVerification proves ownership of a customer-supplied custom hostname via a DNS-TXT challenge.",
    printcolumn = r#"{"name":"Domain","type":"string","jsonPath":".spec.domain"}"#,
    printcolumn = r#"{"name":"Verified","type":"boolean","jsonPath":".status.verified"}"#
)]
#[kube(status = "DomainVerificationStatus")]
#[serde(rename_all = "camelCase")]
pub struct DomainVerificationSpec {
    /// The customer-owned domain to verify, e.g. `customer.com`.
    pub domain: String,
}

/// `CertificateStatus` reports readiness and condition history.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// True once the backend has issued key material and it has been cloned.
    #[serde(default)]
    pub ready: bool,
}

/// Condition type set to `True` once a `Certificate`'s backend issuance has
/// completed and its secret is available to clone.
pub const CERTIFICATE_READY_CONDITION_TYPE: &str = "Ready";

/// `Certificate` requests and tracks a managed TLS certificate for a set of hosts.
///
/// # Example
///
/// ```yaml
/// apiVersion: kuadrant.dev/v1
/// kind: Certificate
/// metadata:
///   name: my-ingress-tls
///   namespace: glbc-system
///   annotations:
///     kuadrant.dev/owner-key: "root|default|my-ingress"
/// spec:
///   hosts: ["abc123.example.test", "app.customer.com"]
///   secretName: my-ingress-tls
///   issuer: glbc-ca
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "kuadrant.dev",
    version = "v1",
    kind = "Certificate",
    namespaced,
    shortname = "cert",
    shortname = "certs",
    doc = "Certificate requests and tracks a managed TLS certificate covering a traffic object's managed and verified custom hosts.",
    printcolumn = r#"{"name":"Issuer","type":"string","jsonPath":".spec.issuer"}"#,
    printcolumn = r#"{"name":"Ready","type":"boolean","jsonPath":".status.ready"}"#
)]
#[kube(status = "CertificateStatus")]
#[serde(rename_all = "camelCase")]
pub struct CertificateSpec {
    /// Hosts the issued certificate must cover: the managed host plus every
    /// currently-verified custom host.
    pub hosts: Vec<String>,

    /// Name of the Kubernetes Secret the issued certificate's key material
    /// should be cloned into, in the owning traffic object's namespace.
    pub secret_name: String,

    /// Certificate backend profile, mirroring the `tls-provider` CLI flag:
    /// `glbc-ca`, `le-staging`, or `le-production`.
    pub issuer: String,
}

/// TLS configuration for one host served by a `Route`.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteTls {
    /// Name of the Secret holding the TLS key material for this host.
    pub secret_name: String,
}

/// Ingress-style load-balancer ingress point admitted for a `Route`.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteLoadBalancerIngress {
    /// Hostname of the admitted load balancer (resolved via the host resolver/hosts watcher).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// IP address of the admitted load balancer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

/// `RouteStatus` reports admitted load-balancer addresses, mirroring Ingress status.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,

    #[serde(default)]
    pub load_balancer: Vec<RouteLoadBalancerIngress>,
}

/// `Route` is a traffic object analogous to an OpenShift Route: unlike
/// Ingress, it carries a single host/service pair rather than a list of rules.
/// It participates in the same Host/DNS/Certificate reconciler chain as Ingress.
///
/// # Example
///
/// ```yaml
/// apiVersion: kuadrant.dev/v1
/// kind: Route
/// metadata:
///   name: my-route
///   namespace: default
/// spec:
///   toService: my-service
///   tls:
///     secretName: my-route-tls
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "kuadrant.dev",
    version = "v1",
    kind = "Route",
    namespaced,
    shortname = "route",
    shortname = "routes",
    doc = "Route is an OpenShift-style traffic object participating in the global load balancer's Host/DNS/Certificate reconciler chain.",
    printcolumn = r#"{"name":"Host","type":"string","jsonPath":".spec.host"}"#,
    printcolumn = r#"{"name":"Service","type":"string","jsonPath":".spec.toService"}"#
)]
#[kube(status = "RouteStatus")]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    /// Publicly reachable hostname for this route. Empty means "assign a
    /// managed host", mirroring an Ingress rule with an empty host.
    #[serde(default)]
    pub host: String,

    /// Name of the Kubernetes Service this route forwards traffic to.
    pub to_service: String,

    /// TLS configuration, if this route terminates TLS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<RouteTls>,
}

#[path = "crd_tests.rs"]
#[cfg(test)]
mod crd_tests;
