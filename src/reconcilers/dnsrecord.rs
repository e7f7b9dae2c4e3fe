// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS-record controller (spec §4.4).
//!
//! Publishes one `DNSRecord`'s endpoints across every configured provider
//! zone, tracking per-zone publication status zone-order-preservingly
//! (iteration order always follows `Context::dns_zones`) and
//! condition-order-insensitively (each zone carries exactly one
//! `DNSRecordFailed` condition, looked up by type rather than position). A
//! zone already published at the current `spec.dnsName`
//! generation is skipped rather than re-ensured, mirroring the upstream
//! `dns_record.go` "already published to zone" short-circuit.

use std::sync::Arc;

use kube::api::{Patch, PatchParams};
use kube::{Api, ResourceExt};
use tracing::{debug, warn};

use crate::context::{parse_owner_key, Context};
use crate::crd::{DNSRecord, DNSRecordStatus, DNSZoneStatus, DnsZoneRef, DNS_RECORD_FAILED_CONDITION_TYPE};
use crate::dispatch;
use crate::errors::{AggregateError, GlbcError};
use crate::labels::{FINALIZER_DNS_RECORD, OWNER_KEY_ANNOTATION};
use crate::metrics;
use crate::reconcilers::finalizers::{ensure_finalizer, remove_finalizer};
use crate::reconcilers::status::{condition_changed, create_condition, find_condition, get_last_transition_time};

const RESOURCE_TYPE: &str = "DNSRecord";

/// Recovers the workspace a `DNSRecord` belongs to from its owner-key annotation.
fn workspace_of(record: &DNSRecord) -> Option<String> {
    record
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(OWNER_KEY_ANNOTATION))
        .and_then(|key| parse_owner_key(key))
        .map(|(workspace, _, _)| workspace.to_string())
}

/// True if a zone status's `DNSRecordFailed` condition reports success.
fn is_published(zone_status: &DNSZoneStatus) -> bool {
    find_condition(&zone_status.conditions, DNS_RECORD_FAILED_CONDITION_TYPE).is_some_and(|c| c.status == "False")
}

/// Ensures (or reuses) one zone's published state, returning its status entry
/// and, on provider failure, the error to fold into the reconcile's aggregate.
async fn publish_to_zone(
    ctx: &Context,
    record: &DNSRecord,
    zone: &DnsZoneRef,
    previous: Option<&DNSZoneStatus>,
) -> (DNSZoneStatus, Option<GlbcError>) {
    let previous_condition =
        previous.and_then(|p| find_condition(&p.conditions, DNS_RECORD_FAILED_CONDITION_TYPE)).cloned();
    let generation_unchanged = record.metadata.generation.is_some()
        && record.metadata.generation == record.status.as_ref().and_then(|s| s.observed_generation);

    if generation_unchanged {
        if let Some(existing) = previous {
            if is_published(existing) {
                return (existing.clone(), None);
            }
        }
    }

    let result = ctx.dns_provider.ensure(&record.spec, zone).await;
    metrics::record_dns_publish(ctx.dns_provider.name(), result.is_ok());

    let (status, reason, message) = match &result {
        Ok(()) => ("False", "ProviderSuccess", "DNS record published successfully".to_string()),
        Err(e) => ("True", e.status_reason(), format!("DNS record publish failed: {e}")),
    };

    let mut condition = create_condition(DNS_RECORD_FAILED_CONDITION_TYPE, status, reason, &message);
    condition.last_transition_time = Some(if condition_changed(&previous_condition, &condition) {
        chrono::Utc::now().to_rfc3339()
    } else {
        get_last_transition_time(
            previous.map_or(&[][..], |p| p.conditions.as_slice()),
            DNS_RECORD_FAILED_CONDITION_TYPE,
        )
    });

    let zone_status = DNSZoneStatus {
        zone: zone.clone(),
        conditions: vec![condition],
        endpoints: record.spec.endpoints.clone(),
    };

    (zone_status, result.err())
}

/// Publishes `record` to every configured zone, in configured-zone order.
async fn publish_record_to_zones(ctx: &Context, record: &DNSRecord) -> (Vec<DNSZoneStatus>, AggregateError) {
    let mut new_zones = Vec::with_capacity(ctx.dns_zones.len());
    let mut errors = AggregateError::new();
    for zone in &ctx.dns_zones {
        let previous = record.status.as_ref().and_then(|s| s.zones.iter().find(|z| &z.zone == zone));
        let (zone_status, err) = publish_to_zone(ctx, record, zone, previous).await;
        if let Some(e) = err {
            errors.push(e);
        }
        new_zones.push(zone_status);
    }
    (new_zones, errors)
}

/// Removes `record` from every zone it was ever published to.
async fn delete_record(ctx: &Context, record: &DNSRecord) -> Result<(), AggregateError> {
    let mut errors = AggregateError::new();
    if let Some(status) = &record.status {
        for zone_status in &status.zones {
            if !is_published(zone_status) {
                continue;
            }
            if let Err(e) = ctx.dns_provider.delete(&record.spec, &zone_status.zone).await {
                errors.push(e);
            }
        }
    }
    errors.into_result()
}

async fn patch_status(client: &kube::Client, record: &DNSRecord, status: &DNSRecordStatus) -> Result<(), GlbcError> {
    let api: Api<DNSRecord> = Api::namespaced(client.clone(), &record.namespace().unwrap_or_default());
    let patch = serde_json::json!({ "status": status });
    api.patch_status(&record.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

/// Reconciles one `DNSRecord`: publishes its endpoints to every configured zone.
///
/// # Errors
///
/// Returns a [`GlbcError::Provider`] summarizing any zone publish failures
/// (aggregated across zones), or [`GlbcError::KubeApi`] if a finalizer or
/// status patch fails.
pub async fn reconcile_dnsrecord(
    record: Arc<DNSRecord>,
    ctx: Arc<Context>,
) -> Result<kube::runtime::controller::Action, GlbcError> {
    let start = std::time::Instant::now();
    let workspace = workspace_of(&record).unwrap_or_default();
    let client = ctx.workspace_router.custom_client(&workspace).await?;

    let result = reconcile_inner(&record, &client, &ctx).await;
    match &result {
        Ok(_) => metrics::record_reconciliation_success(RESOURCE_TYPE, start.elapsed()),
        Err(_) => metrics::record_reconciliation_error(RESOURCE_TYPE, start.elapsed()),
    }
    result
}

async fn reconcile_inner(
    record: &DNSRecord,
    client: &kube::Client,
    ctx: &Context,
) -> Result<kube::runtime::controller::Action, GlbcError> {
    if record.metadata.deletion_timestamp.is_some() {
        return match delete_record(ctx, record).await {
            Ok(()) => {
                remove_finalizer(client, record, FINALIZER_DNS_RECORD)
                    .await
                    .map_err(|e| GlbcError::InvariantViolation(e.to_string()))?;
                Ok(dispatch::done())
            }
            Err(errors) => Err(GlbcError::Provider {
                provider: "dns",
                message: errors.to_string(),
            }),
        };
    }

    ensure_finalizer(client, record, FINALIZER_DNS_RECORD)
        .await
        .map_err(|e| GlbcError::InvariantViolation(e.to_string()))?;

    let (zones, errors) = publish_record_to_zones(ctx, record).await;
    let new_status = DNSRecordStatus {
        zones,
        observed_generation: record.metadata.generation,
    };

    let changed = record.status.as_ref().is_none_or(|current| {
        current.zones != new_status.zones || current.observed_generation != new_status.observed_generation
    });

    if changed {
        patch_status(client, record, &new_status).await?;
    }

    if !errors.is_empty() {
        warn!(record = %record.name_any(), errors = %errors, "DNS publish failed for one or more zones");
        return Err(GlbcError::Provider {
            provider: "dns",
            message: errors.to_string(),
        });
    }

    debug!(record = %record.name_any(), "DNS record published to all zones");
    Ok(dispatch::done())
}

#[path = "dnsrecord_tests.rs"]
#[cfg(test)]
mod dnsrecord_tests;
