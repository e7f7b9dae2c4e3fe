// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS sub-reconciler (spec §4.3.2).
//!
//! Maintains a `DNSRecord` sibling CR whose endpoint set mirrors a traffic
//! object's admitted load-balancer addresses, and registers those addresses'
//! hostnames with the hosts watcher so provider-side changes re-enqueue the
//! owner. Grounded on the `Ensure`/status idiom of the DNS-record controller
//! (`dns_record.go`); unlike that controller, this sub-reconciler only owns
//! the `DNSRecord` object's lifecycle, not its publication to provider zones
//! (that's `reconcilers::dnsrecord`'s job, driven off the `DNSRecord` it
//! creates here).

use std::time::Duration;

use crate::constants::{
    DEFAULT_DNS_RECORD_TTL_SECS, DNS_PENDING_REQUEUE_SECS, DEFAULT_RECORD_TYPE_A, RECORD_TYPE_CNAME,
};
use crate::context::Context;
use crate::crd::{DNSRecord, DNSRecordSpec, Endpoint};
use crate::errors::GlbcError;
use crate::labels::{MANAGED_HOST_ANNOTATION, MANAGED_LABEL, MANAGED_LABEL_VALUE, OWNER_KEY_ANNOTATION};
use crate::reconcilers::resources::{create_or_apply, delete_if_present};
use crate::reconcilers::traffic::{require_managed_host, ChainSignal, TrafficObject};

/// Rewrites a DNS name into a valid Kubernetes resource name.
fn record_name(dns_name: &str) -> String {
    dns_name.replace('.', "-")
}

/// Builds the endpoint set for `managed_host` from `obj`'s admitted
/// load-balancer addresses: an `A` record when IPs are admitted, otherwise a
/// `CNAME` to the first admitted hostname. Empty when nothing is admitted yet.
fn assemble_endpoints(managed_host: &str, obj: &dyn TrafficObject) -> Vec<Endpoint> {
    let ips = obj.lb_ips();
    if !ips.is_empty() {
        return vec![Endpoint {
            dns_name: managed_host.to_string(),
            targets: ips,
            record_type: DEFAULT_RECORD_TYPE_A.to_string(),
            record_ttl: i64::from(DEFAULT_DNS_RECORD_TTL_SECS),
            set_identifier: None,
        }];
    }

    if let Some(target) = obj.lb_hostnames().into_iter().next() {
        return vec![Endpoint {
            dns_name: managed_host.to_string(),
            targets: vec![target],
            record_type: RECORD_TYPE_CNAME.to_string(),
            record_ttl: i64::from(DEFAULT_DNS_RECORD_TTL_SECS),
            set_identifier: None,
        }];
    }

    Vec::new()
}

/// Runs the DNS sub-reconciler over `obj`.
///
/// # Errors
///
/// Returns [`GlbcError::InvariantViolation`] if the Host sub-reconciler has
/// not yet run, or [`GlbcError::KubeApi`] if the `DNSRecord` create/apply/delete fails.
pub async fn reconcile_dns(
    ctx: &Context,
    owner_key: &str,
    obj: &mut dyn TrafficObject,
) -> Result<(ChainSignal, Option<Duration>), GlbcError> {
    let namespace = obj.namespace();
    let client = ctx.workspace_router.custom_client(&obj.workspace()).await?;

    if obj.is_deleting() {
        if let Some(host) = obj.annotation(MANAGED_HOST_ANNOTATION) {
            delete_if_present::<DNSRecord>(&client, &namespace, &record_name(&host)).await?;
        }
        ctx.hosts_watcher.stop_watching(owner_key, "");
        return Ok((ChainSignal::Continue, None));
    }

    let managed_host = require_managed_host(obj)?;
    let name = record_name(&managed_host);
    let endpoints = assemble_endpoints(&managed_host, obj);

    if endpoints.is_empty() {
        delete_if_present::<DNSRecord>(&client, &namespace, &name).await?;
        return Ok((
            ChainSignal::Stop,
            Some(Duration::from_secs(DNS_PENDING_REQUEUE_SECS)),
        ));
    }

    for hostname in obj.lb_hostnames() {
        ctx.hosts_watcher.start_watching(owner_key, &hostname);
    }

    let mut record = DNSRecord::new(
        &name,
        DNSRecordSpec {
            dns_name: managed_host,
            endpoints,
        },
    );
    record.metadata.namespace = Some(namespace.clone());
    record
        .metadata
        .labels
        .get_or_insert_with(Default::default)
        .insert(MANAGED_LABEL.to_string(), MANAGED_LABEL_VALUE.to_string());
    record
        .metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(OWNER_KEY_ANNOTATION.to_string(), owner_key.to_string());

    create_or_apply(&client, &namespace, &record).await?;

    Ok((ChainSignal::Continue, None))
}

#[path = "dns_tests.rs"]
#[cfg(test)]
mod dns_tests;
