// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Adapts the traffic reconciler chain to `networking.k8s.io/v1` `Ingress`
//! (spec §4.7 "Ingress driver").
//!
//! [`IngressObject`] implements [`TrafficObject`] by mapping each
//! `IngressRule` to one [`TrafficRule`] (its `host` plus the whole
//! `HTTPIngressRuleValue` carried opaquely as `backend`), and each
//! `IngressTLS` entry to one [`TlsEntry`] per host it covers. [`reconcile_ingress`]
//! drives the same ensure-finalizer / run-chain / persist-spec sequence as
//! every other controller in this crate, patching only `metadata` and `spec`
//! via server-side apply — `status.loadBalancer` is written by whichever
//! ingress implementation actually admits the object, never by this
//! controller, so it is read here but never patched.

use std::sync::Arc;

use k8s_openapi::api::networking::v1::{HTTPIngressRuleValue, Ingress, IngressRule, IngressTLS};
use kube::api::{Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::{Api, ResourceExt};
use tracing::warn;

use crate::context::{owner_key, Context};
use crate::dispatch;
use crate::errors::GlbcError;
use crate::labels::{
    DEFAULT_WORKSPACE, FINALIZER_TRAFFIC_CASCADE, LEGACY_SYNCER_FINALIZER_PREFIX, WORKSPACE_ANNOTATION,
};
use crate::metrics;
use crate::reconcilers::finalizers::{ensure_finalizer, remove_finalizer_and_legacy};
use crate::reconcilers::resources::FIELD_MANAGER;
use crate::reconcilers::status_changed;
use crate::reconcilers::traffic::{list_domain_verifications, run_chain, ChainOutcome, TlsEntry, TrafficObject, TrafficRule};

const RESOURCE_TYPE: &str = "Ingress";

/// Adapts an owned `Ingress` to the [`TrafficObject`] seam.
pub struct IngressObject {
    inner: Ingress,
}

impl IngressObject {
    #[must_use]
    pub fn new(inner: Ingress) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn into_inner(self) -> Ingress {
        self.inner
    }
}

impl TrafficObject for IngressObject {
    fn kind(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn workspace(&self) -> String {
        self.annotation(WORKSPACE_ANNOTATION)
            .unwrap_or_else(|| DEFAULT_WORKSPACE.to_string())
    }

    fn namespace(&self) -> String {
        self.inner.namespace().unwrap_or_default()
    }

    fn name(&self) -> String {
        self.inner.name_any()
    }

    fn uid(&self) -> String {
        self.inner.uid().unwrap_or_default()
    }

    fn is_deleting(&self) -> bool {
        self.inner.metadata.deletion_timestamp.is_some()
    }

    fn annotation(&self, key: &str) -> Option<String> {
        self.inner.metadata.annotations.as_ref()?.get(key).cloned()
    }

    fn set_annotation(&mut self, key: &str, value: String) {
        self.inner
            .metadata
            .annotations
            .get_or_insert_with(Default::default)
            .insert(key.to_string(), value);
    }

    fn remove_annotation(&mut self, key: &str) {
        if let Some(annotations) = self.inner.metadata.annotations.as_mut() {
            annotations.remove(key);
        }
    }

    fn finalizers(&self) -> Vec<String> {
        self.inner.metadata.finalizers.clone().unwrap_or_default()
    }

    fn rules(&self) -> Vec<TrafficRule> {
        self.inner
            .spec
            .as_ref()
            .and_then(|spec| spec.rules.as_ref())
            .map(|rules| {
                rules
                    .iter()
                    .map(|rule| TrafficRule {
                        host: rule.host.clone().unwrap_or_default(),
                        backend: rule
                            .http
                            .as_ref()
                            .and_then(|http| serde_json::to_value(http).ok())
                            .unwrap_or(serde_json::Value::Null),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn set_rules(&mut self, rules: Vec<TrafficRule>) {
        let new_rules: Vec<IngressRule> = rules
            .into_iter()
            .map(|rule| IngressRule {
                host: (!rule.host.is_empty()).then_some(rule.host),
                http: serde_json::from_value::<HTTPIngressRuleValue>(rule.backend).ok(),
            })
            .collect();
        self.inner.spec.get_or_insert_with(Default::default).rules = Some(new_rules);
    }

    fn tls_entries(&self) -> Vec<TlsEntry> {
        self.inner
            .spec
            .as_ref()
            .and_then(|spec| spec.tls.as_ref())
            .map(|tls| {
                tls.iter()
                    .flat_map(|entry| {
                        let secret_name = entry.secret_name.clone().unwrap_or_default();
                        entry
                            .hosts
                            .clone()
                            .unwrap_or_default()
                            .into_iter()
                            .map(move |host| TlsEntry {
                                host,
                                secret_name: secret_name.clone(),
                            })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn set_tls_entries(&mut self, entries: Vec<TlsEntry>) {
        let grouped = group_tls_by_secret(entries);
        let new_tls: Vec<IngressTLS> = grouped
            .into_iter()
            .map(|(secret_name, hosts)| IngressTLS {
                hosts: Some(hosts),
                secret_name: (!secret_name.is_empty()).then_some(secret_name),
            })
            .collect();
        self.inner.spec.get_or_insert_with(Default::default).tls =
            (!new_tls.is_empty()).then_some(new_tls);
    }

    fn lb_hostnames(&self) -> Vec<String> {
        admitted_ingress_points(&self.inner)
            .iter()
            .filter_map(|point| point.hostname.clone())
            .collect()
    }

    fn lb_ips(&self) -> Vec<String> {
        admitted_ingress_points(&self.inner)
            .iter()
            .filter_map(|point| point.ip.clone())
            .collect()
    }
}

fn admitted_ingress_points(ingress: &Ingress) -> Vec<k8s_openapi::api::networking::v1::IngressLoadBalancerIngress> {
    ingress
        .status
        .as_ref()
        .and_then(|status| status.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.clone())
        .unwrap_or_default()
}

/// Groups TLS entries by secret name, preserving first-seen order, so each
/// secret produces exactly one `IngressTLS` entry covering every host it secures.
fn group_tls_by_secret(entries: Vec<TlsEntry>) -> Vec<(String, Vec<String>)> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for entry in entries {
        match grouped.iter_mut().find(|(secret, _)| *secret == entry.secret_name) {
            Some((_, hosts)) => hosts.push(entry.host),
            None => grouped.push((entry.secret_name, vec![entry.host])),
        }
    }
    grouped
}

/// Patches `ingress`'s `metadata` and `spec` via server-side apply, leaving
/// `status` untouched so the controller never contends with whatever admits
/// the object's load-balancer status.
async fn patch_traffic_fields(client: &kube::Client, mut ingress: Ingress) -> Result<(), GlbcError> {
    let namespace = ingress.namespace().unwrap_or_default();
    let name = ingress.name_any();
    ingress.status = None;
    ingress.metadata.managed_fields = None;
    ingress.metadata.resource_version = None;

    let api: Api<Ingress> = Api::namespaced(client.clone(), &namespace);
    api.patch(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Apply(&ingress))
        .await?;
    Ok(())
}

/// Reconciles one `Ingress` through the Host/DNS/Certificate chain.
///
/// # Errors
///
/// Returns a [`GlbcError::Provider`] aggregating any sub-reconciler failure,
/// or [`GlbcError::KubeApi`] if a finalizer or spec patch fails.
pub async fn reconcile_ingress(obj: Arc<Ingress>, ctx: Arc<Context>) -> Result<Action, GlbcError> {
    let start = std::time::Instant::now();
    let result = reconcile_inner((*obj).clone(), &ctx).await;
    match &result {
        Ok(_) => metrics::record_reconciliation_success(RESOURCE_TYPE, start.elapsed()),
        Err(_) => metrics::record_reconciliation_error(RESOURCE_TYPE, start.elapsed()),
    }
    result
}

async fn reconcile_inner(ingress: Ingress, ctx: &Context) -> Result<Action, GlbcError> {
    let mut wrapper = IngressObject::new(ingress);
    let workspace = wrapper.workspace();
    let client = ctx.workspace_router.dynamic_client(&workspace).await?;
    let key = owner_key(&workspace, &wrapper.namespace(), &wrapper.name());

    if wrapper.is_deleting() {
        if wrapper.finalizers().iter().any(|f| f == FINALIZER_TRAFFIC_CASCADE) {
            // Every sub-reconciler's deletion path ignores `domain_verifications`.
            let outcome = run_chain(ctx, &key, &mut wrapper, &[]).await;
            if !outcome.errors.is_empty() {
                return Err(chain_error(outcome));
            }
            let current = wrapper.into_inner();
            remove_finalizer_and_legacy(
                &client,
                &current,
                FINALIZER_TRAFFIC_CASCADE,
                LEGACY_SYNCER_FINALIZER_PREFIX,
            )
            .await
            .map_err(|e| GlbcError::InvariantViolation(e.to_string()))?;
        }
        return Ok(dispatch::done());
    }

    {
        let current = wrapper.into_inner();
        ensure_finalizer(&client, &current, FINALIZER_TRAFFIC_CASCADE)
            .await
            .map_err(|e| GlbcError::InvariantViolation(e.to_string()))?;
        wrapper = IngressObject::new(current);
    }

    let before_rules = wrapper.rules();
    let before_tls = wrapper.tls_entries();
    let before_annotations = wrapper.inner.metadata.annotations.clone();

    let dvs = list_domain_verifications(ctx).await?;
    let outcome = run_chain(ctx, &key, &mut wrapper, &dvs).await;

    let changed = status_changed(&Some(before_rules), &Some(wrapper.rules()))
        || status_changed(&Some(before_tls), &Some(wrapper.tls_entries()))
        || status_changed(&before_annotations, &wrapper.inner.metadata.annotations);

    let updated = wrapper.into_inner();
    if changed {
        patch_traffic_fields(&client, updated).await?;
    }

    if !outcome.errors.is_empty() {
        warn!(ingress = %key, errors = %outcome.errors, "traffic chain failed for one or more sub-reconcilers");
        return Err(chain_error(outcome));
    }

    Ok(match outcome.requeue_after {
        Some(delay) => dispatch::requeue_after(delay),
        None => dispatch::done(),
    })
}

fn chain_error(outcome: ChainOutcome) -> GlbcError {
    GlbcError::Provider {
        provider: "traffic-chain",
        message: outcome.errors.to_string(),
    }
}

#[path = "ingress_tests.rs"]
#[cfg(test)]
mod ingress_tests;
