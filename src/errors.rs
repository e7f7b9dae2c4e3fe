// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the GLBC reconciliation engine.
//!
//! This module provides a single structured error enum (`GlbcError`) covering
//! the error kinds a reconciler can produce, plus an `AggregateError` used to
//! carry forward the results of every sub-reconciler in a chain even past a
//! `Stop`, so the controller can report and retry on the union of failures
//! rather than just the first one encountered.

use thiserror::Error;

/// Errors produced by GLBC reconcilers.
///
/// Each variant corresponds to one of the error kinds in the error handling
/// design: transient I/O is retried with backoff, not-found is absorbed as
/// success by the caller, provider-permanent errors are surfaced on status,
/// and invariant violations are alarmed after the retry budget is spent.
#[derive(Error, Debug)]
pub enum GlbcError {
    /// Kubernetes API error (conflict, network, 5xx) — retried with backoff.
    #[error("kubernetes API error: {0}")]
    KubeApi(#[from] kube::Error),

    /// The object being reconciled no longer exists; treated as success by the caller.
    #[error("object not found: {0}")]
    NotFound(String),

    /// A required side input (secret, sibling resource) has not appeared yet; retried.
    #[error("required side input not found: {0}")]
    SideInputNotFound(String),

    /// The DNS provider or cert provider returned a permanent-looking error
    /// (invalid zone, auth failure). Retried with capped backoff and
    /// surfaced via a `DNSRecordFailed`-style condition.
    #[error("provider error ({provider}): {message}")]
    Provider {
        /// Name of the provider capability that failed (`dns`, `cert`).
        provider: &'static str,
        /// Provider-supplied error message.
        message: String,
    },

    /// A structural invariant was violated: a managed-host annotation went
    /// missing on a later pass, or an annotation held malformed JSON.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// JSON (de)serialization of an annotation payload failed.
    #[error("annotation JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// DNS resolution failure from the host resolver or DNS verifier capability.
    #[error("DNS resolution error: {0}")]
    Resolution(String),

    /// HTTP transport error reaching a provider backend.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GlbcError {
    /// Returns true if this error should be retried with exponential backoff
    /// rather than treated as a terminal, alarm-worthy failure.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvariantViolation(_))
    }

    /// Kubernetes status condition reason for this error, used when writing
    /// `DNSRecordFailed`/equivalent conditions.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::KubeApi(_) => "ApiError",
            Self::NotFound(_) => "NotFound",
            Self::SideInputNotFound(_) => "SideInputNotFound",
            Self::Provider { .. } => "ProviderError",
            Self::InvariantViolation(_) => "InvariantViolation",
            Self::Json(_) => "InvalidAnnotation",
            Self::Resolution(_) => "ResolutionFailed",
            Self::Http(_) => "HttpError",
        }
    }
}

/// Aggregates errors across every member of a reconciler chain.
///
/// The traffic reconciler chain runs Host, DNS, and Certificate
/// sub-reconcilers in order; even after one reports `Stop`, the remaining
/// errors already collected from earlier members must be reported together
/// rather than discarded. Mirrors the aggregate-error idiom of joining each
/// member's `Display` output behind one error type.
#[derive(Debug, Default)]
pub struct AggregateError {
    errors: Vec<GlbcError>,
}

impl AggregateError {
    /// Creates an empty aggregate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an error to the aggregate.
    pub fn push(&mut self, err: GlbcError) {
        self.errors.push(err);
    }

    /// Returns true if no errors have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of errors recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if every recorded error is retryable.
    #[must_use]
    pub fn all_retryable(&self) -> bool {
        self.errors.iter().all(GlbcError::is_retryable)
    }

    /// Converts this aggregate into a `Result`: `Ok(())` if empty, otherwise
    /// `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns `Err(self)` if any error was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for AggregateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.errors.len() == 1 {
            return write!(f, "{}", self.errors[0]);
        }
        writeln!(f, "{} errors occurred:", self.errors.len())?;
        for e in &self.errors {
            writeln!(f, "  * {e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

#[path = "errors_tests.rs"]
#[cfg(test)]
mod errors_tests;
