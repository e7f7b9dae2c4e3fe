use super::*;

// These tests exercise only the cache behavior of `MultiTenantRouter`, since
// constructing a real `kube::Client` requires a live API server. The router
// contract under test -- "the same workspace name always maps to a client
// drawn from the same underlying connection" -- does not depend on that.

fn fake_client() -> Client {
    Client::try_from(kube::Config::new("https://localhost:6443".parse().unwrap()))
        .expect("building a client from a bare Config should not touch the network")
}

#[tokio::test]
async fn single_tenant_router_ignores_workspace_argument() {
    let router = SingleTenantRouter::new(fake_client());
    let a = router.core_client("workspace-a").await.unwrap();
    let b = router.core_client("workspace-b").await.unwrap();
    assert_eq!(format!("{a:?}"), format!("{b:?}"));
}

#[tokio::test]
async fn multi_tenant_router_caches_per_workspace() {
    let router = MultiTenantRouter::new(fake_client());
    let _ = router.core_client("tenant-1").await.unwrap();
    let _ = router.dynamic_client("tenant-1").await.unwrap();
    assert_eq!(router.cache.read().len(), 1);
    let _ = router.custom_client("tenant-2").await.unwrap();
    assert_eq!(router.cache.read().len(), 2);
}
