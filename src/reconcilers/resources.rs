// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Generic create-or-update helper for sibling custom resources.
//!
//! The DNS and Certificate sub-reconcilers each own one namespaced sibling CR
//! per traffic object (`DNSRecord`, `Certificate`). Both upsert it the same
//! way: server-side apply if it exists, create otherwise. Factored out once
//! here instead of duplicated in each sub-reconciler.

use kube::api::{Patch, PatchParams, PostParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use tracing::debug;

use crate::errors::GlbcError;

/// Field manager name stamped on every server-side apply this crate performs.
pub const FIELD_MANAGER: &str = "glbc-controller";

/// Creates `resource` if it doesn't exist in `namespace`, otherwise applies
/// it via server-side apply.
///
/// # Errors
///
/// Returns [`GlbcError::KubeApi`] if the resource has no name, or if the
/// create/patch call itself fails.
pub async fn create_or_apply<T>(client: &Client, namespace: &str, resource: &T) -> Result<(), GlbcError>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    let name = resource.meta().name.clone().ok_or_else(|| {
        GlbcError::InvariantViolation(format!("{} resource has no name", T::kind(&())))
    })?;

    let api: Api<T> = Api::namespaced(client.clone(), namespace);

    if api.get(&name).await.is_ok() {
        debug!(kind = %T::kind(&()), namespace, name, "applying update to existing sibling resource");
        api.patch(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Apply(resource))
            .await?;
    } else {
        debug!(kind = %T::kind(&()), namespace, name, "creating sibling resource");
        api.create(&PostParams::default(), resource).await?;
    }

    Ok(())
}

/// Deletes `name` from `namespace`. A resource that's already gone is success, not an error.
///
/// # Errors
///
/// Returns [`GlbcError::KubeApi`] if the delete call fails for a reason other than not-found.
pub async fn delete_if_present<T>(client: &Client, namespace: &str, name: &str) -> Result<(), GlbcError>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    let api: Api<T> = Api::namespaced(client.clone(), namespace);
    match api.delete(name, &Default::default()).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(()),
        Err(e) => Err(GlbcError::KubeApi(e)),
    }
}

#[path = "resources_tests.rs"]
#[cfg(test)]
mod resources_tests;
