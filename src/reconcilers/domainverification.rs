// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Domain-verification controller (spec §4.5).
//!
//! Proves ownership of a customer-supplied custom hostname by checking for a
//! deterministic TXT challenge record at `_kuadrant-verification.<domain>`.
//! `status.verified` is monotonic: once set, this reconciler returns
//! immediately without touching the resource again, so a later transient
//! resolver failure (or a customer removing the TXT record) can never flip
//! it back to `false`. That check runs before any other work in this
//! reconcile, deliberately, since recomputing the token or timestamps ahead
//! of it would read as a write even when nothing downstream observes it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use kube::api::{Patch, PatchParams};
use kube::{Api, ResourceExt};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::constants::DEFAULT_RECHECK_INTERVAL_SECS;
use crate::context::Context;
use crate::crd::{DomainVerification, DomainVerificationStatus};
use crate::dispatch;
use crate::errors::GlbcError;
use crate::metrics;

const RESOURCE_TYPE: &str = "DomainVerification";

/// Deterministic challenge token derived from the object's name and uid, so
/// a recreated `DomainVerification` (same name, new uid) gets a fresh token
/// rather than reusing a stale one a customer already published.
fn verification_token(name: &str, uid: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(b":");
    hasher.update(uid.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..32].to_string()
}

/// Time remaining before `next_check`, or `None` if it's unset, unparseable,
/// or already in the past (meaning a recheck is due now).
fn remaining_backoff(next_check: Option<&str>, now: DateTime<Utc>) -> Option<Duration> {
    let next = DateTime::parse_from_rfc3339(next_check?).ok()?.with_timezone(&Utc);
    let remaining = next - now;
    if remaining > chrono::Duration::zero() {
        remaining.to_std().ok()
    } else {
        None
    }
}

async fn patch_status(client: &kube::Client, obj: &DomainVerification, status: &DomainVerificationStatus) -> Result<(), GlbcError> {
    let api: Api<DomainVerification> = Api::all(client.clone());
    let patch = serde_json::json!({ "status": status });
    api.patch_status(&obj.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

/// Reconciles one `DomainVerification`: checks for the TXT challenge record
/// and, once found, latches `status.verified` permanently.
///
/// # Errors
///
/// Returns [`GlbcError::KubeApi`] if the status patch fails. A failed TXT
/// lookup is not an error here: it is recorded on `status.message` and
/// retried on the recheck interval, per spec §4.5.
pub async fn reconcile_domainverification(
    obj: Arc<DomainVerification>,
    ctx: Arc<Context>,
) -> Result<kube::runtime::controller::Action, GlbcError> {
    let start = std::time::Instant::now();
    let result = reconcile_inner(&obj, &ctx).await;
    match &result {
        Ok(_) => metrics::record_reconciliation_success(RESOURCE_TYPE, start.elapsed()),
        Err(_) => metrics::record_reconciliation_error(RESOURCE_TYPE, start.elapsed()),
    }
    result
}

async fn reconcile_inner(
    obj: &DomainVerification,
    ctx: &Context,
) -> Result<kube::runtime::controller::Action, GlbcError> {
    if obj.metadata.deletion_timestamp.is_some() {
        return Ok(dispatch::done());
    }

    if obj.status.as_ref().is_some_and(|s| s.verified) {
        return Ok(dispatch::done());
    }

    let now = Utc::now();
    if let Some(remaining) = remaining_backoff(obj.status.as_ref().and_then(|s| s.next_check.as_deref()), now) {
        return Ok(dispatch::requeue_after(remaining));
    }

    let uid = obj.uid().unwrap_or_default();
    let token = verification_token(&obj.name_any(), &uid);

    let lookup = ctx.dns_verifier.txt_record_exists(&obj.spec.domain, &token).await;
    let (verified, message, metric_result) = match &lookup {
        Ok(true) => (true, "TXT challenge record verified".to_string(), "verified"),
        Ok(false) => (false, "TXT challenge record not yet published".to_string(), "pending"),
        Err(e) => (false, format!("verification lookup failed: {e}"), "error"),
    };
    metrics::record_domain_verification_attempt(metric_result);
    metrics::set_domain_verification_pending(&obj.spec.domain, !verified);

    let next_check = if verified {
        None
    } else {
        Some((now + chrono::Duration::seconds(DEFAULT_RECHECK_INTERVAL_SECS as i64)).to_rfc3339())
    };

    let new_status = DomainVerificationStatus {
        token,
        verified,
        last_checked: Some(now.to_rfc3339()),
        next_check,
        message: Some(message),
    };

    patch_status(&ctx.client, obj, &new_status).await?;

    if verified {
        debug!(domain = %obj.spec.domain, "domain verification succeeded");
        Ok(dispatch::done())
    } else {
        Ok(dispatch::requeue_after(Duration::from_secs(DEFAULT_RECHECK_INTERVAL_SECS)))
    }
}

#[path = "domainverification_tests.rs"]
#[cfg(test)]
mod domainverification_tests;
