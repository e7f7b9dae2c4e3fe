use super::*;

#[tokio::test]
async fn mock_resolver_returns_fixed_set() {
    let resolver = MockHostResolver::new([IpAddr::from([10, 0, 0, 1]), IpAddr::from([10, 0, 0, 2])]);
    let ips = resolver.lookup_ip_addr("lb-1.example.aws").await.unwrap();
    assert_eq!(ips.len(), 2);
    assert!(ips.contains(&IpAddr::from([10, 0, 0, 1])));
}

#[test]
fn resolver_from_env_defaults_without_e2e_mock() {
    std::env::remove_var("HOST_RESOLVER");
    let _resolver = resolver_from_env();
}
