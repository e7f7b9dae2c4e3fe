// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `dns_verifier.rs`

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_verification_record_name() {
        assert_eq!(
            verification_record_name("customer.com"),
            "_kuadrant-verification.customer.com"
        );
    }

    #[tokio::test]
    async fn test_fake_verifier_unpublished_is_false() {
        let verifier = FakeDnsVerifier::new();
        assert!(!verifier
            .txt_record_exists("customer.com", "tok123")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_fake_verifier_published_is_true() {
        let verifier = FakeDnsVerifier::new();
        verifier.publish("customer.com", "tok123");
        assert!(verifier
            .txt_record_exists("customer.com", "tok123")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_fake_verifier_wrong_token_is_false() {
        let verifier = FakeDnsVerifier::new();
        verifier.publish("customer.com", "tok123");
        assert!(!verifier
            .txt_record_exists("customer.com", "wrong-token")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_fake_verifier_simulates_delayed_publication() {
        // Mirrors end-to-end scenario 3: the TXT lookup initially returns
        // nothing, then the token appears once the customer publishes it.
        let verifier = FakeDnsVerifier::new();
        assert!(!verifier
            .txt_record_exists("customer.com", "tok123")
            .await
            .unwrap());
        verifier.publish("customer.com", "tok123");
        assert!(verifier
            .txt_record_exists("customer.com", "tok123")
            .await
            .unwrap());
    }
}
