// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label and annotation constants used across all reconcilers.
//!
//! This module defines standard Kubernetes labels and GLBC-specific labels/annotations
//! to ensure consistency across all resources created by the controller.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the component name within the architecture
pub const K8S_COMPONENT: &str = "app.kubernetes.io/component";

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of the application
pub const K8S_NAME: &str = "app.kubernetes.io/name";

/// Standard label for a unique name identifying the instance of an application
pub const K8S_INSTANCE: &str = "app.kubernetes.io/instance";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

/// Value for `app.kubernetes.io/part-of` indicating this resource is part of GLBC
pub const PART_OF_GLBC: &str = "glbc";

// ============================================================================
// Managed-artifact label
// ============================================================================

/// Label marking artifacts (Certificates, Secrets, DNSRecords) owned by the
/// system. Informer filters drop objects without it.
pub const MANAGED_LABEL: &str = "kuadrant.dev/managed";

/// Value of [`MANAGED_LABEL`] on artifacts owned by the system.
pub const MANAGED_LABEL_VALUE: &str = "true";

// ============================================================================
// GLBC Annotations
// ============================================================================

/// Assigned public hostname for a traffic object, e.g. `<uid>.<parentDomain>`.
pub const MANAGED_HOST_ANNOTATION: &str = "kuadrant.dev/managed-host";

/// JSON `{rules:[{host}]}` of hosts awaiting domain verification.
pub const PENDING_CUSTOM_HOSTS_ANNOTATION: &str = "kuadrant.dev/pending-custom-hosts";

/// Diagnostic annotation set when custom hosts were stripped (custom hosts disabled).
pub const CUSTOM_HOSTS_REPLACED_ANNOTATION: &str = "kuadrant.dev/custom-hosts-replaced";

/// JSON map `custom-host -> rule-index` recording the generated-twin rule set.
pub const GENERATED_RULES_ANNOTATION: &str = "kuadrant.dev/generated-rules";

/// Composite `workspace|namespace|name` annotation on DNSRecords/Certificates/Secrets,
/// used for reverse lookup back to the owning traffic object.
pub const OWNER_KEY_ANNOTATION: &str = "kuadrant.dev/owner-key";

/// Logical workspace a traffic object (Ingress/Route) belongs to. Absent on a
/// single-tenant deployment, where every object implicitly belongs to
/// [`DEFAULT_WORKSPACE`].
pub const WORKSPACE_ANNOTATION: &str = "kuadrant.dev/workspace";

/// Workspace name assumed for a traffic object with no [`WORKSPACE_ANNOTATION`].
pub const DEFAULT_WORKSPACE: &str = "root";

/// JSON-encoded cache of a `Route`'s full rule set (a verified custom host
/// plus its managed-host twin), since `Route.spec` exposes only a single
/// `host` field. Plays the role `spec.rules` plays for Ingress.
pub const ROUTE_RULES_ANNOTATION: &str = "kuadrant.dev/route-rules";

/// Issuer label stamped on secrets cloned from an issued Certificate.
pub const TLS_ISSUER_ANNOTATION: &str = "kuadrant.dev/tls-issuer";

/// Unix-seconds timestamp stamped at first `Ensure` call for a Certificate.
pub const CERTIFICATE_REQUEST_TIME_ANNOTATION: &str = "kuadrant.dev/certificate-request-time";

// ============================================================================
// Finalizers
// ============================================================================

/// Cascade-cleanup finalizer added to traffic objects (Ingress/Route) on first observation.
pub const FINALIZER_TRAFFIC_CASCADE: &str = "kuadrant.dev/traffic-cascade";

/// Finalizer held on a `DNSRecord` until every zone confirms deletion.
pub const FINALIZER_DNS_RECORD: &str = "kuadrant.dev/dnsrecord-finalizer";

/// Prefix matching legacy "syncer" finalizers that are opportunistically stripped
/// during the finalizer cascade.
pub const LEGACY_SYNCER_FINALIZER_PREFIX: &str = "syncer.kcp.dev/";
