// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the GLBC controller.
//!
//! This module provides metrics collection with the namespace prefix
//! `glbc` (prometheus-safe).
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Track reconciliation operations and their outcomes
//! - **DNS Metrics** - Track DNS record publication and provider errors
//! - **Domain Verification Metrics** - Track TXT-challenge verification attempts
//! - **Certificate Metrics** - Track certificate issuance and pending duration
//! - **Host Resolver Metrics** - Track hosts-watcher resolution activity
//! - **Leader Election Metrics** - Track leadership state changes
//!
//! # Example
//!
//! ```rust,no_run
//! use glbc::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success("Route", std::time::Duration::from_secs(1));
//! ```

use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all GLBC metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "glbc";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry.
///
/// All metrics are registered in this registry and exposed via the `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by resource type and status.
///
/// Labels:
/// - `resource_type`: Kind of resource (e.g., `Route`, `Ingress`, `DNSRecord`)
/// - `status`: Outcome (`success`, `error`, `requeue`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliations by resource type and status",
    );
    let counter = CounterVec::new(opts, &["resource_type", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds.
///
/// Labels:
/// - `resource_type`: Kind of resource (e.g., `Route`, `Ingress`, `DNSRecord`)
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds by resource type",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Total number of requeue operations.
///
/// Labels:
/// - `resource_type`: Kind of resource
/// - `reason`: Reason for requeue (`error`, `pending_verification`, `pending_certificate`)
pub static REQUEUE_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_requeues_total"),
        "Total number of requeue operations by resource type and reason",
    );
    let counter = CounterVec::new(opts, &["resource_type", "reason"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// DNS Metrics
// ============================================================================

/// Total number of DNS record publish operations.
///
/// Labels:
/// - `provider`: DNS provider capability in use (e.g., `fake`, `aws`)
/// - `status`: Outcome (`success`, `error`)
pub static DNS_PUBLISH_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_dns_publish_total"),
        "Total number of DNS record publish operations by provider and outcome",
    );
    let counter = CounterVec::new(opts, &["provider", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of DNS provider errors.
///
/// Labels:
/// - `provider`: DNS provider capability in use
pub static DNS_PROVIDER_ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_dns_provider_errors_total"),
        "Total number of DNS provider errors by provider",
    );
    let counter = CounterVec::new(opts, &["provider"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Domain Verification Metrics
// ============================================================================

/// Total number of domain verification attempts.
///
/// Labels:
/// - `result`: Outcome of the TXT lookup (`verified`, `pending`, `error`)
pub static DOMAIN_VERIFICATION_ATTEMPTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_domain_verification_attempts_total"),
        "Total number of domain verification attempts by result",
    );
    let counter = CounterVec::new(opts, &["result"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Number of domains currently pending verification.
pub static DOMAIN_VERIFICATION_PENDING: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_domain_verification_pending"),
        "Number of domains currently pending verification",
    );
    let gauge = GaugeVec::new(opts, &["domain"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Certificate Metrics
// ============================================================================

/// Total number of certificate issuance attempts.
///
/// Labels:
/// - `issuer`: Certificate provider profile (e.g., `glbc-ca`, `le-staging`)
/// - `status`: Outcome (`success`, `error`)
pub static CERTIFICATE_ISSUANCE_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_certificate_issuance_total"),
        "Total number of certificate issuance attempts by issuer and outcome",
    );
    let counter = CounterVec::new(opts, &["issuer", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration a certificate has spent pending, in seconds, observed at ready time.
///
/// Labels:
/// - `issuer`: Certificate provider profile
pub static CERTIFICATE_PENDING_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_certificate_pending_seconds"),
        "Duration a certificate spent pending before becoming ready",
    )
    .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]);
    let histogram = HistogramVec::new(opts, &["issuer"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Number of certificates currently pending issuance.
///
/// Labels:
/// - `issuer`: Certificate provider profile
pub static CERTIFICATE_PENDING: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_certificate_pending"),
        "Number of certificates currently pending issuance by issuer",
    );
    let gauge = GaugeVec::new(opts, &["issuer"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Host Resolver Metrics
// ============================================================================

/// Total number of host resolution attempts performed by the hosts watcher.
///
/// Labels:
/// - `status`: Outcome (`resolved`, `unresolved`, `error`)
pub static HOST_RESOLUTIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_host_resolutions_total"),
        "Total number of host resolution attempts by outcome",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Number of hosts currently tracked by the hosts watcher.
pub static HOSTS_WATCHED: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_hosts_watched"),
        "Number of hosts currently tracked by the hosts watcher",
    );
    let gauge = GaugeVec::new(opts, &["workspace"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Leader Election Metrics
// ============================================================================

/// Total number of leader election events.
///
/// Labels:
/// - `status`: Event type (`acquired`, `lost`, `renewed`)
pub static LEADER_ELECTIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_leader_elections_total"),
        "Total number of leader election events by status",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Current leader election status.
///
/// Labels:
/// - `pod_name`: Name of the pod
///
/// Value: 1 if leader, 0 if follower.
pub static LEADER_STATUS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_leader_status"),
        "Current leader election status (1 = leader, 0 = follower)",
    );
    let gauge = GaugeVec::new(opts, &["pod_name"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Records a successful reconciliation.
pub fn record_reconciliation_success(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "success"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Records a failed reconciliation.
pub fn record_reconciliation_error(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "error"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Records a reconciliation requeue.
pub fn record_reconciliation_requeue(resource_type: &str, reason: &str) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "requeue"])
        .inc();
    REQUEUE_TOTAL
        .with_label_values(&[resource_type, reason])
        .inc();
}

/// Records a DNS publish attempt.
pub fn record_dns_publish(provider: &str, success: bool) {
    DNS_PUBLISH_TOTAL
        .with_label_values(&[provider, if success { "success" } else { "error" }])
        .inc();
    if !success {
        DNS_PROVIDER_ERRORS_TOTAL.with_label_values(&[provider]).inc();
    }
}

/// Records a domain verification attempt outcome (`verified`, `pending`, `error`).
pub fn record_domain_verification_attempt(result: &str) {
    DOMAIN_VERIFICATION_ATTEMPTS_TOTAL
        .with_label_values(&[result])
        .inc();
}

/// Sets the current pending/verified gauge value for a domain (1 = pending, 0 = verified).
pub fn set_domain_verification_pending(domain: &str, pending: bool) {
    DOMAIN_VERIFICATION_PENDING
        .with_label_values(&[domain])
        .set(if pending { 1.0 } else { 0.0 });
}

/// Sets whether a certificate is currently pending issuance (1) or ready (0).
pub fn set_certificate_pending(issuer: &str, pending: bool) {
    CERTIFICATE_PENDING
        .with_label_values(&[issuer])
        .set(if pending { 1.0 } else { 0.0 });
}

/// Records a certificate issuance attempt and, on success, the time spent pending.
pub fn record_certificate_issuance(issuer: &str, success: bool, pending: Duration) {
    CERTIFICATE_ISSUANCE_TOTAL
        .with_label_values(&[issuer, if success { "success" } else { "error" }])
        .inc();
    if success {
        CERTIFICATE_PENDING_SECONDS
            .with_label_values(&[issuer])
            .observe(pending.as_secs_f64());
    }
}

/// Records a host resolution attempt outcome (`resolved`, `unresolved`, `error`).
pub fn record_host_resolution(status: &str) {
    HOST_RESOLUTIONS_TOTAL.with_label_values(&[status]).inc();
}

/// Sets the number of hosts currently tracked for a workspace.
pub fn set_hosts_watched(workspace: &str, count: i64) {
    HOSTS_WATCHED
        .with_label_values(&[workspace])
        .set(count as f64);
}

/// Records leader election acquired.
pub fn record_leader_elected(pod_name: &str) {
    LEADER_ELECTIONS_TOTAL
        .with_label_values(&["acquired"])
        .inc();
    LEADER_STATUS.with_label_values(&[pod_name]).set(1.0);
}

/// Records leader election lost.
pub fn record_leader_lost(pod_name: &str) {
    LEADER_ELECTIONS_TOTAL.with_label_values(&["lost"]).inc();
    LEADER_STATUS.with_label_values(&[pod_name]).set(0.0);
}

/// Records leader election lease renewal.
pub fn record_leader_renewed() {
    LEADER_ELECTIONS_TOTAL.with_label_values(&["renewed"]).inc();
}

/// Gathers and encodes all metrics in Prometheus text format.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[path = "metrics_tests.rs"]
#[cfg(test)]
mod metrics_tests;
