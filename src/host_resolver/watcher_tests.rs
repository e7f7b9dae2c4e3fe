use super::*;
use crate::host_resolver::MockHostResolver;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn start_watching_is_idempotent() {
    let watcher = HostsWatcher::new(Arc::new(MockHostResolver::new([])), Duration::from_secs(30));
    watcher.start_watching("ns/ingress-a", "lb-1.example.aws");
    watcher.start_watching("ns/ingress-a", "lb-1.example.aws");
    assert_eq!(
        watcher.list_host_record_watchers("ns/ingress-a"),
        vec!["lb-1.example.aws".to_string()]
    );
}

#[test]
fn stop_watching_empty_host_removes_whole_key() {
    let watcher = HostsWatcher::new(Arc::new(MockHostResolver::new([])), Duration::from_secs(30));
    watcher.start_watching("ns/ingress-a", "lb-1.example.aws");
    watcher.start_watching("ns/ingress-a", "lb-2.example.aws");
    watcher.stop_watching("ns/ingress-a", "");
    assert_eq!(watcher.watched_key_count(), 0);
}

#[test]
fn stop_watching_single_host_leaves_others() {
    let watcher = HostsWatcher::new(Arc::new(MockHostResolver::new([])), Duration::from_secs(30));
    watcher.start_watching("ns/ingress-a", "lb-1.example.aws");
    watcher.start_watching("ns/ingress-a", "lb-2.example.aws");
    watcher.stop_watching("ns/ingress-a", "lb-1.example.aws");
    assert_eq!(
        watcher.list_host_record_watchers("ns/ingress-a"),
        vec!["lb-2.example.aws".to_string()]
    );
}

#[tokio::test]
async fn tick_fires_on_change_when_address_set_changes() {
    let resolver = Arc::new(MockHostResolver::new([IpAddr::from([10, 0, 0, 1])]));
    let watcher = Arc::new(HostsWatcher::new(resolver, Duration::from_secs(30)));
    watcher.start_watching("ns/ingress-a", "lb-1.example.aws");

    let fired = Arc::new(AtomicUsize::new(0));
    let fired_clone = Arc::clone(&fired);
    watcher.set_on_change(Arc::new(move |_key: &str| {
        fired_clone.fetch_add(1, Ordering::SeqCst);
    }));

    watcher.tick().await;
    assert_eq!(fired.load(Ordering::SeqCst), 1, "first resolution is a change from empty");

    watcher.tick().await;
    assert_eq!(
        fired.load(Ordering::SeqCst),
        1,
        "second tick resolves to the same set, no further callback"
    );
}
