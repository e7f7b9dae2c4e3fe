use super::*;

#[test]
fn record_reconciliation_success_updates_counter_and_histogram() {
    record_reconciliation_success("RouteTest", Duration::from_millis(500));
    let counter = RECONCILIATION_TOTAL.with_label_values(&["RouteTest", "success"]);
    assert!(counter.get() > 0.0);
    let histogram = RECONCILIATION_DURATION_SECONDS.with_label_values(&["RouteTest"]);
    assert!(histogram.get_sample_count() > 0);
}

#[test]
fn record_reconciliation_error_updates_counter() {
    record_reconciliation_error("RouteErrTest", Duration::from_millis(250));
    let counter = RECONCILIATION_TOTAL.with_label_values(&["RouteErrTest", "error"]);
    assert!(counter.get() > 0.0);
}

#[test]
fn record_dns_publish_failure_increments_provider_errors() {
    record_dns_publish("faketest", false);
    let errors = DNS_PROVIDER_ERRORS_TOTAL.with_label_values(&["faketest"]);
    assert!(errors.get() > 0.0);
    let publishes = DNS_PUBLISH_TOTAL.with_label_values(&["faketest", "error"]);
    assert!(publishes.get() > 0.0);
}

#[test]
fn record_certificate_issuance_success_observes_pending_duration() {
    record_certificate_issuance("glbc-ca-test", true, Duration::from_secs(10));
    let histogram = CERTIFICATE_PENDING_SECONDS.with_label_values(&["glbc-ca-test"]);
    assert!(histogram.get_sample_count() > 0);
}

#[test]
fn set_domain_verification_pending_toggles_gauge() {
    set_domain_verification_pending("example.test", true);
    assert_eq!(
        DOMAIN_VERIFICATION_PENDING
            .with_label_values(&["example.test"])
            .get(),
        1.0
    );
    set_domain_verification_pending("example.test", false);
    assert_eq!(
        DOMAIN_VERIFICATION_PENDING
            .with_label_values(&["example.test"])
            .get(),
        0.0
    );
}

#[test]
fn gather_metrics_contains_namespace_prefix() {
    record_reconciliation_success("GatherTest", Duration::from_millis(100));
    let result = gather_metrics();
    assert!(result.is_ok(), "gathering metrics should succeed");
    let text = result.unwrap();
    assert!(text.contains("glbc_reconciliations_total"));
}
