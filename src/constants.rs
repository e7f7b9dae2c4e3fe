// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the GLBC operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for all GLBC CRDs
pub const API_GROUP: &str = "kuadrant.dev";

/// API version for all GLBC CRDs
pub const API_VERSION: &str = "v1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "kuadrant.dev/v1";

/// Kind name for `DNSRecord` resource
pub const KIND_DNS_RECORD: &str = "DNSRecord";

/// Kind name for `DomainVerification` resource
pub const KIND_DOMAIN_VERIFICATION: &str = "DomainVerification";

/// Kind name for `Certificate` resource
pub const KIND_CERTIFICATE: &str = "Certificate";

/// Kind name for `Route` resource
pub const KIND_ROUTE: &str = "Route";

// ============================================================================
// DNS-TXT Domain Verification Constants
// ============================================================================

/// Subdomain label under which the verification TXT record must be published.
///
/// For a `DomainVerification` of `example.com`, the challenge record is
/// published at `_kuadrant-verification.example.com`.
pub const DNS_VERIFICATION_LABEL: &str = "_kuadrant-verification";

/// Default interval between domain verification recheck attempts.
pub const DEFAULT_RECHECK_INTERVAL_SECS: u64 = 5;

// ============================================================================
// DNS Record Constants
// ============================================================================

/// Default TTL for managed DNS records, in seconds.
pub const DEFAULT_DNS_RECORD_TTL_SECS: i32 = 60;

/// Default record type used when publishing resolved IPv4 load-balancer targets.
pub const DEFAULT_RECORD_TYPE_A: &str = "A";

/// Record type used when the load-balancer target is itself a hostname.
pub const RECORD_TYPE_CNAME: &str = "CNAME";

// ============================================================================
// Controller Error Handling Constants
// ============================================================================

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Requeue duration used by the DNS sub-reconciler when a traffic object has
/// no admitted load-balancer addresses yet.
pub const DNS_PENDING_REQUEUE_SECS: u64 = 5;

// ============================================================================
// Host Resolution Constants
// ============================================================================

/// Default interval between hosts-watcher re-resolution sweeps (30 seconds).
pub const HOSTS_WATCHER_DEFAULT_INTERVAL_SECS: u64 = 30;

/// Maximum number of hosts resolved concurrently per hosts-watcher tick.
pub const HOSTS_WATCHER_MAX_CONCURRENCY: usize = 16;

// ============================================================================
// Leader Election Constants
// ============================================================================

/// Default leader election lease duration (15 seconds)
pub const DEFAULT_LEASE_DURATION_SECS: u64 = 15;

/// Default leader election renew deadline (10 seconds)
pub const DEFAULT_LEASE_RENEW_DEADLINE_SECS: u64 = 10;

/// Default leader election retry period (2 seconds)
pub const DEFAULT_LEASE_RETRY_PERIOD_SECS: u64 = 2;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for the Tokio runtime.
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Default number of concurrent reconciles per controller ("N workers" in the spec).
pub const DEFAULT_CONTROLLER_WORKERS: u16 = 2;

// ============================================================================
// Kubernetes Client Constants
// ============================================================================

/// Default queries-per-second for the Kubernetes API client, matching kubectl's default.
pub const KUBE_CLIENT_QPS: f32 = 20.0;

/// Default burst allowance for the Kubernetes API client, matching kubectl's default.
pub const KUBE_CLIENT_BURST: u32 = 30;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
