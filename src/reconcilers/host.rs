// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Host sub-reconciler (spec §4.3.1).
//!
//! Ensures a traffic object has a managed hostname, then harmonizes its rule
//! set against `DomainVerification` state: verified custom hosts get their
//! own rule plus a generated twin pointed at the managed host; unverified
//! ones get only the twin, and any TLS entry for them is stripped. With
//! custom hosts disabled, every rule is simply rewritten onto the managed
//! host. Grounded directly on the upstream `hostReconciler` (`host_reconciler.go`).

use std::collections::BTreeMap;
use std::time::Duration;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::crd::DomainVerification;
use crate::errors::GlbcError;
use crate::labels::{
    CUSTOM_HOSTS_REPLACED_ANNOTATION, GENERATED_RULES_ANNOTATION, MANAGED_HOST_ANNOTATION,
    PENDING_CUSTOM_HOSTS_ANNOTATION,
};
use crate::reconcilers::traffic::{ChainSignal, TlsEntry, TrafficObject, TrafficRule};

const UID_LENGTH: usize = 20;
const UID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// One entry in the `pending-custom-hosts` annotation payload.
#[derive(Serialize, Deserialize)]
struct PendingHostEntry {
    host: String,
}

/// `{"rules":[{"host":...}, ...]}` shape of the `pending-custom-hosts` annotation.
#[derive(Serialize, Deserialize)]
struct PendingCustomHosts {
    rules: Vec<PendingHostEntry>,
}

/// Generates a collision-resistant 20-character lowercase alphanumeric id,
/// mirroring the upstream's `xid.New()` call.
fn generate_uid() -> String {
    let mut rng = rand::rng();
    let mut buf = [0u8; UID_LENGTH];
    rng.fill_bytes(&mut buf);
    buf.iter()
        .map(|b| UID_CHARSET[(*b as usize) % UID_CHARSET.len()] as char)
        .collect()
}

/// Builds a fresh managed host under `domain`.
fn new_managed_host(domain: &str) -> String {
    format!("{}.{domain}", generate_uid())
}

/// `true` if `host`'s parent-domain chain includes `domain` (recursive
/// suffix match: `app.sub.customer.com` matches domain `customer.com`).
/// Shared with the cross-resource `DomainVerification` watch fan-out
/// (spec §4.7), which needs the same suffix logic to map a verified domain
/// back to every `Ingress`/`Route` whose rules or `pending-custom-hosts`
/// annotation reference it.
#[must_use]
pub fn host_matches(host: &str, domain: &str) -> bool {
    match host.split_once('.') {
        Some((_, rest)) => rest == domain || host_matches(rest, domain),
        None => false,
    }
}

/// Parses the `pending-custom-hosts` annotation payload into its bare host
/// strings. Returns an empty vec on missing/malformed input rather than an
/// error: callers (the `DomainVerification` watch mapper) use this only to
/// decide whether to re-enqueue an owner, so a parse failure should not
/// propagate into the controller's error-handling path.
#[must_use]
pub fn pending_hosts_from_annotation(json: &str) -> Vec<String> {
    serde_json::from_str::<PendingCustomHosts>(json)
        .map(|payload| payload.rules.into_iter().map(|entry| entry.host).collect())
        .unwrap_or_default()
}

fn find_domain_verification<'a>(
    host: &str,
    dvs: &'a [DomainVerification],
) -> Option<&'a DomainVerification> {
    if host.trim().is_empty() {
        return None;
    }
    dvs.iter().find(|dv| host_matches(host, &dv.spec.domain))
}

fn is_verified(dv: Option<&DomainVerification>) -> bool {
    dv.and_then(|d| d.status.as_ref())
        .is_some_and(|s| s.verified)
}

/// Rewrites every non-managed rule onto `managed_host`, recording the
/// original custom hosts in a diagnostic message. Used when custom hosts are
/// disabled entirely.
fn replace_custom_hosts(
    rules: &[TrafficRule],
    tls: &[TlsEntry],
    managed_host: &str,
) -> (Vec<TrafficRule>, Vec<TlsEntry>, Option<String>) {
    let mut custom_hosts = Vec::new();
    let new_rules: Vec<TrafficRule> = rules
        .iter()
        .map(|rule| {
            if rule.host == managed_host {
                rule.clone()
            } else {
                custom_hosts.push(rule.host.clone());
                TrafficRule {
                    host: managed_host.to_string(),
                    backend: rule.backend.clone(),
                }
            }
        })
        .collect();

    let new_tls: Vec<TlsEntry> = tls
        .iter()
        .filter(|entry| !custom_hosts.contains(&entry.host))
        .cloned()
        .collect();

    let message = if custom_hosts.is_empty() {
        None
    } else {
        Some(format!(
            "replaced custom hosts {custom_hosts:?} with the managed host due to custom host policy not being allowed"
        ))
    };

    (new_rules, new_tls, message)
}

/// Outcome of harmonizing the rule set against domain-verification state.
struct CustomHostsResult {
    rules: Vec<TrafficRule>,
    tls: Vec<TlsEntry>,
    generated_rules_json: String,
    pending_hosts: Vec<String>,
}

/// Ports `doProcessCustomHostValidation`: builds the preserved-rule set,
/// the canonical `generated-rules` map, and the list of hosts still pending
/// verification (whose TLS entries must be stripped).
fn process_custom_hosts(
    rules: &[TrafficRule],
    tls: &[TlsEntry],
    managed_host: &str,
    current_generated_rules_json: Option<&str>,
    dvs: &[DomainVerification],
) -> Result<CustomHostsResult, GlbcError> {
    let current_generated_rules: BTreeMap<String, usize> = match current_generated_rules_json {
        Some(json) if !json.is_empty() => serde_json::from_str(json)?,
        _ => BTreeMap::new(),
    };

    let mut preserved_rules: Vec<TrafficRule> = Vec::new();
    let mut generated_rules: BTreeMap<String, usize> = BTreeMap::new();
    let mut next_index = 0usize;

    for (host, &rule_index) in &current_generated_rules {
        if let Some(rule) = rules.get(rule_index) {
            preserved_rules.push(rule.clone());
            generated_rules.insert(host.clone(), next_index);
            next_index += 1;
        }
    }

    let mut pending_hosts: Vec<String> = Vec::new();

    for rule in rules {
        if rule.host == managed_host {
            continue;
        }

        let dv = find_domain_verification(&rule.host, dvs);
        if is_verified(dv) {
            preserved_rules.push(rule.clone());
            next_index += 1;
        } else if !rule.host.trim().is_empty() {
            pending_hosts.push(rule.host.clone());
        }

        if generated_rules.contains_key(&rule.host) {
            continue;
        }

        let twin = TrafficRule {
            host: managed_host.to_string(),
            backend: rule.backend.clone(),
        };
        preserved_rules.push(twin);
        generated_rules.insert(rule.host.clone(), next_index);
        next_index += 1;
    }

    for (host, &generated_index) in &generated_rules {
        let Some(generated_rule) = preserved_rules.get(generated_index) else {
            continue;
        };
        if !is_verified(find_domain_verification(host, dvs)) {
            continue;
        }
        if preserved_rules.iter().any(|r| &r.host == host) {
            continue;
        }
        let custom_rule = TrafficRule {
            host: host.clone(),
            backend: generated_rule.backend.clone(),
        };
        preserved_rules.push(custom_rule);
    }

    let new_tls: Vec<TlsEntry> = tls
        .iter()
        .filter(|entry| !pending_hosts.contains(&entry.host))
        .cloned()
        .collect();

    let generated_rules_json = serde_json::to_string(&generated_rules)?;

    Ok(CustomHostsResult {
        rules: preserved_rules,
        tls: new_tls,
        generated_rules_json,
        pending_hosts,
    })
}

/// Runs the Host sub-reconciler over `obj`.
///
/// # Errors
///
/// Returns [`GlbcError::Json`] if the `generated-rules` annotation holds
/// malformed JSON.
pub async fn reconcile_host(
    ctx: &Context,
    obj: &mut dyn TrafficObject,
    domain_verifications: &[DomainVerification],
) -> Result<(ChainSignal, Option<Duration>), GlbcError> {
    apply(&ctx.domain, ctx.custom_hosts_enabled, obj, domain_verifications)
}

/// Pure body of [`reconcile_host`], factored out so it's testable without a
/// [`Context`] (no sub-reconciler capability this algorithm needs depends on
/// one — it only ever reads the parent domain and the custom-hosts flag).
fn apply(
    domain: &str,
    custom_hosts_enabled: bool,
    obj: &mut dyn TrafficObject,
    domain_verifications: &[DomainVerification],
) -> Result<(ChainSignal, Option<Duration>), GlbcError> {
    if obj.is_deleting() {
        return Ok((ChainSignal::Continue, None));
    }

    let managed_host = match obj.annotation(MANAGED_HOST_ANNOTATION) {
        Some(host) if !host.is_empty() => host,
        _ => {
            let host = new_managed_host(domain);
            obj.set_annotation(MANAGED_HOST_ANNOTATION, host);
            return Ok((ChainSignal::Stop, None));
        }
    };

    if custom_hosts_enabled {
        let existing = obj.annotation(GENERATED_RULES_ANNOTATION);
        let result = process_custom_hosts(
            &obj.rules(),
            &obj.tls_entries(),
            &managed_host,
            existing.as_deref(),
            domain_verifications,
        )?;
        obj.remove_annotation(CUSTOM_HOSTS_REPLACED_ANNOTATION);
        obj.set_rules(result.rules);
        obj.set_tls_entries(result.tls);
        obj.set_annotation(GENERATED_RULES_ANNOTATION, result.generated_rules_json);

        if result.pending_hosts.is_empty() {
            obj.remove_annotation(PENDING_CUSTOM_HOSTS_ANNOTATION);
        } else {
            let payload = PendingCustomHosts {
                rules: result
                    .pending_hosts
                    .into_iter()
                    .map(|host| PendingHostEntry { host })
                    .collect(),
            };
            obj.set_annotation(PENDING_CUSTOM_HOSTS_ANNOTATION, serde_json::to_string(&payload)?);
        }
    } else {
        let (rules, tls, replaced_message) =
            replace_custom_hosts(&obj.rules(), &obj.tls_entries(), &managed_host);
        obj.set_rules(rules);
        obj.set_tls_entries(tls);
        obj.remove_annotation(PENDING_CUSTOM_HOSTS_ANNOTATION);
        match replaced_message {
            Some(message) => obj.set_annotation(CUSTOM_HOSTS_REPLACED_ANNOTATION, message),
            None => obj.remove_annotation(CUSTOM_HOSTS_REPLACED_ANNOTATION),
        }
    }

    Ok((ChainSignal::Continue, None))
}

#[path = "host_tests.rs"]
#[cfg(test)]
mod host_tests;
