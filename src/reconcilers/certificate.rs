// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Certificate sub-reconciler (spec §4.3.3).
//!
//! Ensures one managed `Certificate` per traffic object, covering its
//! managed host plus every currently-verified custom host, then clones the
//! issued secret into the owner's namespace once the backend reports ready.
//! `Certificate` CRs live in the operator's own namespace regardless of
//! which workspace the owning traffic object belongs to (`Context::client`);
//! the cloned TLS secret is written through the workspace-routed client into
//! the owner's namespace instead, mirroring the split the upstream
//! `certificate.go` controller draws between the CR and the secret it feeds.

use std::collections::BTreeMap;
use std::time::Duration;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::Api;

use crate::cert_provider::IssuedSecret;
use crate::context::Context;
use crate::crd::{Certificate, CertificateSpec};
use crate::errors::GlbcError;
use crate::labels::{
    CERTIFICATE_REQUEST_TIME_ANNOTATION, MANAGED_HOST_ANNOTATION, MANAGED_LABEL, MANAGED_LABEL_VALUE,
    OWNER_KEY_ANNOTATION, TLS_ISSUER_ANNOTATION,
};
use crate::metrics;
use crate::reconcilers::resources::{create_or_apply, delete_if_present};
use crate::reconcilers::traffic::{require_managed_host, ChainSignal, TlsEntry, TrafficObject};

/// Derives a stable `Certificate`/cloned-secret resource name from an owner key.
fn cert_name(owner_key: &str) -> String {
    owner_key.replace(['|', '/', '.'], "-")
}

/// Unique, sorted set of hosts a traffic object's current rules cover.
fn certificate_hosts(obj: &dyn TrafficObject) -> Vec<String> {
    let mut hosts: Vec<String> = obj.rules().into_iter().map(|rule| rule.host).collect();
    hosts.sort();
    hosts.dedup();
    hosts
}

/// The secret name a cloned certificate should be written under: the first
/// declared TLS entry's secret, or a default derived from the object's name.
fn default_secret_name(obj: &dyn TrafficObject) -> String {
    obj.tls_entries()
        .into_iter()
        .next()
        .map(|entry| entry.secret_name)
        .unwrap_or_else(|| format!("{}-tls", obj.name()))
}

/// Runs the Certificate sub-reconciler over `obj`.
///
/// # Errors
///
/// Returns [`GlbcError::InvariantViolation`] if the Host sub-reconciler has
/// not yet run, or a [`GlbcError::Provider`]/[`GlbcError::KubeApi`] on
/// backend or API failures.
pub async fn reconcile_certificate(
    ctx: &Context,
    owner_key: &str,
    obj: &mut dyn TrafficObject,
) -> Result<(ChainSignal, Option<Duration>), GlbcError> {
    let name = cert_name(owner_key);

    if obj.is_deleting() {
        delete_if_present::<Certificate>(&ctx.client, &ctx.operator_namespace, &name).await?;
        match ctx.cert_provider.delete(&name).await {
            Ok(()) => {}
            Err(GlbcError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        let secret_name = default_secret_name(obj);
        let workspace_client = ctx.workspace_router.core_client(&obj.workspace()).await?;
        delete_if_present::<Secret>(&workspace_client, &obj.namespace(), &secret_name).await?;
        return Ok((ChainSignal::Continue, None));
    }

    require_managed_host(obj)?;
    let hosts = certificate_hosts(obj);
    if hosts.is_empty() {
        return Ok((ChainSignal::Continue, None));
    }

    let secret_name = default_secret_name(obj);
    let issuer = ctx.tls_provider.as_str();

    let api: Api<Certificate> = Api::namespaced(ctx.client.clone(), &ctx.operator_namespace);
    let existing = match api.get(&name).await {
        Ok(current) => Some(current),
        Err(kube::Error::Api(e)) if e.code == 404 => None,
        Err(e) => return Err(GlbcError::KubeApi(e)),
    };

    let request_time = existing
        .as_ref()
        .and_then(|current| current.metadata.annotations.as_ref())
        .and_then(|a| a.get(CERTIFICATE_REQUEST_TIME_ANNOTATION))
        .cloned()
        .unwrap_or_else(|| chrono::Utc::now().timestamp().to_string());

    let hosts_changed = existing
        .as_ref()
        .is_some_and(|current| current.spec.hosts != hosts);
    let is_new = existing.is_none();

    let mut cert = Certificate::new(
        &name,
        CertificateSpec {
            hosts: hosts.clone(),
            secret_name: secret_name.clone(),
            issuer: issuer.to_string(),
        },
    );
    cert.metadata.namespace = Some(ctx.operator_namespace.clone());
    cert.metadata
        .labels
        .get_or_insert_with(BTreeMap::new)
        .insert(MANAGED_LABEL.to_string(), MANAGED_LABEL_VALUE.to_string());
    let annotations = cert.metadata.annotations.get_or_insert_with(BTreeMap::new);
    annotations.insert(OWNER_KEY_ANNOTATION.to_string(), owner_key.to_string());
    annotations.insert(
        CERTIFICATE_REQUEST_TIME_ANNOTATION.to_string(),
        request_time.clone(),
    );

    if is_new {
        ctx.cert_provider.create(&name, &hosts).await?;
    } else if hosts_changed {
        ctx.cert_provider.update(&name, &hosts).await?;
    }

    create_or_apply(&ctx.client, &ctx.operator_namespace, &cert).await?;

    let ready = ctx.cert_provider.get_certificate_status(&name).await?;
    metrics::set_certificate_pending(issuer, !ready);

    if !ready {
        return Ok((ChainSignal::Continue, None));
    }

    let issued = ctx.cert_provider.get_certificate_secret(&name).await?;
    let pending = request_time
        .parse::<i64>()
        .ok()
        .map(|requested_at| chrono::Utc::now().timestamp() - requested_at)
        .filter(|&secs| secs >= 0)
        .map(|secs| Duration::from_secs(secs as u64))
        .unwrap_or(Duration::ZERO);
    metrics::record_certificate_issuance(issuer, true, pending);

    clone_secret_into_owner(ctx, obj, &secret_name, &issued).await?;

    if obj.tls_entries().is_empty() {
        let managed_host = obj.annotation(MANAGED_HOST_ANNOTATION).unwrap_or_default();
        obj.set_tls_entries(vec![TlsEntry {
            host: managed_host,
            secret_name,
        }]);
    }

    Ok((ChainSignal::Continue, None))
}

/// Clones the backend-issued TLS key material into a `kubernetes.io/tls`
/// Secret named `secret_name`, in `obj`'s own workspace and namespace.
async fn clone_secret_into_owner(
    ctx: &Context,
    obj: &dyn TrafficObject,
    secret_name: &str,
    issued: &IssuedSecret,
) -> Result<(), GlbcError> {
    let client = ctx.workspace_router.core_client(&obj.workspace()).await?;

    let mut data = BTreeMap::new();
    data.insert("tls.crt".to_string(), ByteString(issued.tls_crt.clone()));
    data.insert("tls.key".to_string(), ByteString(issued.tls_key.clone()));

    let mut secret = Secret {
        metadata: ObjectMeta {
            name: Some(secret_name.to_string()),
            namespace: Some(obj.namespace()),
            ..Default::default()
        },
        type_: Some("kubernetes.io/tls".to_string()),
        data: Some(data),
        ..Default::default()
    };
    secret
        .metadata
        .labels
        .get_or_insert_with(BTreeMap::new)
        .insert(MANAGED_LABEL.to_string(), MANAGED_LABEL_VALUE.to_string());
    secret
        .metadata
        .annotations
        .get_or_insert_with(BTreeMap::new)
        .insert(
            TLS_ISSUER_ANNOTATION.to_string(),
            ctx.tls_provider.as_str().to_string(),
        );

    create_or_apply(&client, &obj.namespace(), &secret).await
}

#[path = "certificate_tests.rs"]
#[cfg(test)]
mod certificate_tests;
