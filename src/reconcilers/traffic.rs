// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Traffic-object reconciler chain.
//!
//! Per spec §4.3, every traffic object (Ingress or Route) runs through the
//! same ordered chain — Host, then DNS, then Certificate — regardless of
//! which concrete resource type it came from. [`TrafficObject`] is the seam:
//! `reconcilers::ingress` and `reconcilers::route` each implement it over
//! their own CRD/`k8s-openapi` type, and [`run_chain`] drives the chain
//! without ever knowing which one it's holding, mirroring the `traffic.Interface`
//! abstraction the Go controller built on top of `Ingress`/`Route`.

use std::time::Duration;

use kube::api::ListParams;
use kube::Api;

use crate::context::Context;
use crate::crd::DomainVerification;
use crate::errors::{AggregateError, GlbcError};
use crate::reconcilers::{certificate, dns, host};

/// One routing rule: a host plus an opaque routing payload (Ingress's
/// `HTTPIngressRuleValue`, or nothing for a Route, which has exactly one
/// implicit rule). Sub-reconcilers only ever read/write `host`; `backend` is
/// carried through untouched so `set_rules` can reconstruct the concrete
/// resource's native rule type.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TrafficRule {
    pub host: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub backend: serde_json::Value,
}

/// One TLS entry: a host and the secret its key material lives in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TlsEntry {
    pub host: String,
    pub secret_name: String,
}

/// A union of `Ingress` and `Route`: the rules+TLS+LB-status surface both
/// present to the reconciler chain, per spec §3's `TrafficObject` definition.
pub trait TrafficObject: Send {
    /// `"Ingress"` or `"Route"`, used in metric labels and log fields.
    fn kind(&self) -> &'static str;

    /// Logical workspace this object lives in.
    fn workspace(&self) -> String;

    fn namespace(&self) -> String;

    fn name(&self) -> String;

    fn uid(&self) -> String;

    fn is_deleting(&self) -> bool;

    fn annotation(&self, key: &str) -> Option<String>;

    fn set_annotation(&mut self, key: &str, value: String);

    fn remove_annotation(&mut self, key: &str);

    fn finalizers(&self) -> Vec<String>;

    fn rules(&self) -> Vec<TrafficRule>;

    fn set_rules(&mut self, rules: Vec<TrafficRule>);

    fn tls_entries(&self) -> Vec<TlsEntry>;

    fn set_tls_entries(&mut self, entries: Vec<TlsEntry>);

    /// Hostnames of admitted load-balancer ingress points.
    fn lb_hostnames(&self) -> Vec<String>;

    /// IP addresses of admitted load-balancer ingress points.
    fn lb_ips(&self) -> Vec<String>;
}

/// What a sub-reconciler asks the chain to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainSignal {
    /// Run the next sub-reconciler in the chain.
    Continue,
    /// Abort the remainder of the chain for this pass (spec §4.3: "Stop aborts
    /// the remainder of the chain"). Does not by itself indicate an error.
    Stop,
}

/// Result of running the full Host/DNS/Certificate chain once.
#[derive(Debug, Default)]
pub struct ChainOutcome {
    /// Earliest explicit delayed-requeue request from any chain member, if any.
    pub requeue_after: Option<Duration>,
    /// Every error raised by a chain member this pass, even ones raised
    /// after another member already signaled `Stop`.
    pub errors: AggregateError,
}

fn earliest(a: Option<Duration>, b: Option<Duration>) -> Option<Duration> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Runs the Host, DNS, and Certificate sub-reconcilers over `obj` in order.
///
/// A sub-reconciler error does not, by itself, stop the chain — later
/// members still run and their errors are aggregated together, per spec §7
/// ("the controller aggregates errors from all chain members ... into a
/// multi-error"). Only an explicit `ChainSignal::Stop` return aborts the
/// remainder of the chain for this pass.
pub async fn run_chain(
    ctx: &Context,
    owner_key: &str,
    obj: &mut dyn TrafficObject,
    domain_verifications: &[DomainVerification],
) -> ChainOutcome {
    let mut outcome = ChainOutcome::default();
    let mut signal = ChainSignal::Continue;

    if signal == ChainSignal::Continue {
        match host::reconcile_host(ctx, obj, domain_verifications).await {
            Ok((next, delay)) => {
                signal = next;
                outcome.requeue_after = earliest(outcome.requeue_after, delay);
            }
            Err(e) => outcome.errors.push(e),
        }
    }

    if signal == ChainSignal::Continue {
        match dns::reconcile_dns(ctx, owner_key, obj).await {
            Ok((next, delay)) => {
                signal = next;
                outcome.requeue_after = earliest(outcome.requeue_after, delay);
            }
            Err(e) => outcome.errors.push(e),
        }
    }

    if signal == ChainSignal::Continue {
        match certificate::reconcile_certificate(ctx, owner_key, obj).await {
            Ok((_next, delay)) => {
                outcome.requeue_after = earliest(outcome.requeue_after, delay);
            }
            Err(e) => outcome.errors.push(e),
        }
    }

    outcome
}

/// Lists every `DomainVerification` in the cluster. `DomainVerification` is
/// cluster-scoped and lives in the operator's own client regardless of which
/// workspace a traffic object referencing it belongs to, so every traffic
/// controller consults the same list through [`Context::client`].
///
/// # Errors
///
/// Returns [`GlbcError::KubeApi`] if the list call fails.
pub async fn list_domain_verifications(ctx: &Context) -> Result<Vec<DomainVerification>, GlbcError> {
    let api: Api<DomainVerification> = Api::all(ctx.client.clone());
    Ok(api.list(&ListParams::default()).await?.items)
}

/// Returns [`GlbcError::InvariantViolation`] if `obj` has no managed-host
/// annotation yet. Used by the DNS and Certificate sub-reconcilers, which
/// both require the Host sub-reconciler to have already run successfully.
pub(crate) fn require_managed_host(obj: &dyn TrafficObject) -> Result<String, GlbcError> {
    obj.annotation(crate::labels::MANAGED_HOST_ANNOTATION).ok_or_else(|| {
        GlbcError::InvariantViolation(format!(
            "{} {}/{} has no managed-host annotation",
            obj.kind(),
            obj.namespace(),
            obj.name()
        ))
    })
}

#[path = "traffic_tests.rs"]
#[cfg(test)]
mod traffic_tests;
