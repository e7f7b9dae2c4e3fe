// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Adapts the traffic reconciler chain to the `Route` CRD (spec §4.7 "Route
//! driver").
//!
//! Unlike Ingress, `Route.spec` carries a single `host` field rather than a
//! rule list, mirroring the OpenShift Route this type is modeled on. The
//! Host sub-reconciler's custom-host canonicalization can still produce two
//! rules for one object (a verified custom host plus its managed-host
//! twin), so [`RouteObject`] caches the full rule set in the
//! [`ROUTE_RULES_ANNOTATION`](crate::labels::ROUTE_RULES_ANNOTATION)
//! annotation — playing the role `spec.rules` plays for Ingress — and keeps
//! `spec.host`/`spec.toService` in sync with the first (highest-priority)
//! entry for display and for whatever actually routes traffic to the object.

use std::sync::Arc;

use kube::api::{Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::{Api, ResourceExt};
use tracing::warn;

use crate::context::{owner_key, Context};
use crate::crd::{Route, RouteTls};
use crate::dispatch;
use crate::errors::GlbcError;
use crate::labels::{
    DEFAULT_WORKSPACE, FINALIZER_TRAFFIC_CASCADE, LEGACY_SYNCER_FINALIZER_PREFIX, ROUTE_RULES_ANNOTATION,
    WORKSPACE_ANNOTATION,
};
use crate::metrics;
use crate::reconcilers::finalizers::{ensure_finalizer, remove_finalizer_and_legacy};
use crate::reconcilers::resources::FIELD_MANAGER;
use crate::reconcilers::status_changed;
use crate::reconcilers::traffic::{list_domain_verifications, run_chain, ChainOutcome, TlsEntry, TrafficObject, TrafficRule};

const RESOURCE_TYPE: &str = "Route";

/// Adapts an owned `Route` to the [`TrafficObject`] seam.
pub struct RouteObject {
    inner: Route,
    rules: Vec<TrafficRule>,
}

impl RouteObject {
    #[must_use]
    pub fn new(inner: Route) -> Self {
        let rules = inner
            .metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(ROUTE_RULES_ANNOTATION))
            .and_then(|json| serde_json::from_str::<Vec<TrafficRule>>(json).ok())
            .unwrap_or_else(|| {
                vec![TrafficRule {
                    host: inner.spec.host.clone(),
                    backend: serde_json::Value::String(inner.spec.to_service.clone()),
                }]
            });
        Self { inner, rules }
    }

    /// Writes the cached rule set back into the `Route`: the full list into
    /// [`ROUTE_RULES_ANNOTATION`], and the first entry into `spec.host`/`spec.toService`.
    #[must_use]
    pub fn into_inner(mut self) -> Route {
        if let Ok(json) = serde_json::to_string(&self.rules) {
            self.inner
                .metadata
                .annotations
                .get_or_insert_with(Default::default)
                .insert(ROUTE_RULES_ANNOTATION.to_string(), json);
        }
        if let Some(primary) = self.rules.first() {
            self.inner.spec.host = primary.host.clone();
            if let Some(service) = primary.backend.as_str() {
                self.inner.spec.to_service = service.to_string();
            }
        }
        self.inner
    }
}

impl TrafficObject for RouteObject {
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
        self.rules.clone()
    }

    fn set_rules(&mut self, rules: Vec<TrafficRule>) {
        self.rules = rules;
    }

    fn tls_entries(&self) -> Vec<TlsEntry> {
        match &self.inner.spec.tls {
            Some(tls) => {
                let host = self.rules.first().map(|r| r.host.clone()).unwrap_or_default();
                vec![TlsEntry {
                    host,
                    secret_name: tls.secret_name.clone(),
                }]
            }
            None => Vec::new(),
        }
    }

    fn set_tls_entries(&mut self, entries: Vec<TlsEntry>) {
        self.inner.spec.tls = entries.into_iter().next().map(|entry| RouteTls {
            secret_name: entry.secret_name,
        });
    }

    fn lb_hostnames(&self) -> Vec<String> {
        self.inner
            .status
            .as_ref()
            .map(|status| status.load_balancer.iter().filter_map(|lb| lb.hostname.clone()).collect())
            .unwrap_or_default()
    }

    fn lb_ips(&self) -> Vec<String> {
        self.inner
            .status
            .as_ref()
            .map(|status| status.load_balancer.iter().filter_map(|lb| lb.ip.clone()).collect())
            .unwrap_or_default()
    }
}

/// Patches `route`'s `metadata` and `spec` via server-side apply, leaving
/// `status` untouched for the same reason as the Ingress driver.
async fn patch_traffic_fields(client: &kube::Client, mut route: Route) -> Result<(), GlbcError> {
    let namespace = route.namespace().unwrap_or_default();
    let name = route.name_any();
    route.status = None;
    route.metadata.managed_fields = None;
    route.metadata.resource_version = None;

    let api: Api<Route> = Api::namespaced(client.clone(), &namespace);
    api.patch(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Apply(&route))
        .await?;
    Ok(())
}

/// Reconciles one `Route` through the Host/DNS/Certificate chain.
///
/// # Errors
///
/// Returns a [`GlbcError::Provider`] aggregating any sub-reconciler failure,
/// or [`GlbcError::KubeApi`] if a finalizer or spec patch fails.
pub async fn reconcile_route(obj: Arc<Route>, ctx: Arc<Context>) -> Result<Action, GlbcError> {
    let start = std::time::Instant::now();
    let result = reconcile_inner((*obj).clone(), &ctx).await;
    match &result {
        Ok(_) => metrics::record_reconciliation_success(RESOURCE_TYPE, start.elapsed()),
        Err(_) => metrics::record_reconciliation_error(RESOURCE_TYPE, start.elapsed()),
    }
    result
}

async fn reconcile_inner(route: Route, ctx: &Context) -> Result<Action, GlbcError> {
    let mut wrapper = RouteObject::new(route);
    let workspace = wrapper.workspace();
    let client = ctx.workspace_router.custom_client(&workspace).await?;
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
        wrapper = RouteObject::new(current);
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
        warn!(route = %key, errors = %outcome.errors, "traffic chain failed for one or more sub-reconcilers");
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

#[path = "route_tests.rs"]
#[cfg(test)]
mod route_tests;
