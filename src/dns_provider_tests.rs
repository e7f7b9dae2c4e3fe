use super::*;

fn sample_record() -> DNSRecordSpec {
    DNSRecordSpec {
        dns_name: "abc123.example.test".into(),
        endpoints: vec![],
    }
}

fn sample_zone() -> DnsZoneRef {
    DnsZoneRef {
        id: "Z123".into(),
        dns_name: Some("example.test".into()),
    }
}

#[tokio::test]
async fn fake_provider_ensure_then_delete_round_trips() {
    let provider = FakeDnsProvider::new();
    let record = sample_record();
    let zone = sample_zone();
    assert!(!provider.is_published(&record, &zone));
    provider.ensure(&record, &zone).await.unwrap();
    assert!(provider.is_published(&record, &zone));
    provider.delete(&record, &zone).await.unwrap();
    assert!(!provider.is_published(&record, &zone));
}

#[tokio::test]
async fn flaky_provider_fails_configured_count_then_succeeds() {
    let provider = FlakyDnsProvider::new(2);
    let record = sample_record();
    let zone = sample_zone();

    assert!(provider.ensure(&record, &zone).await.is_err());
    assert!(provider.ensure(&record, &zone).await.is_err());
    assert!(provider.ensure(&record, &zone).await.is_ok());
}
