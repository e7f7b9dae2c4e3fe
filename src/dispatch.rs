// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Generic work-dispatch substrate.
//!
//! Per spec §4.1 every controller owns a named, rate-limited queue and runs
//! a fixed number of cooperative workers pulling from it. `kube::runtime::Controller`
//! already provides the queue (an informer-backed watch stream, deduplicated
//! per key) and the worker pool (`Controller::concurrency`); this module
//! supplies the two pieces the spec calls out that `Controller` leaves to the
//! caller: a shared error policy translating a `GlbcError` into a requeue
//! decision, and named helpers for the three dispatch outcomes (forget,
//! requeue-with-backoff, requeue-after-delay) so every reconciler module
//! expresses them the same way.

use std::sync::Arc;
use std::time::Duration;

use kube::runtime::controller::Action;
use tracing::warn;

use crate::constants::ERROR_REQUEUE_DURATION_SECS;
use crate::context::Context;
use crate::errors::GlbcError;
use crate::metrics;

/// Multiplier applied to [`ERROR_REQUEUE_DURATION_SECS`] for non-retryable
/// (invariant-violation) errors: still retried eventually, per spec §7's
/// "after retry budget the key is abandoned and alarmed", but far less
/// eagerly than a transient failure.
const INVARIANT_VIOLATION_BACKOFF_MULTIPLIER: u64 = 10;

/// Forgets the key: nothing more to do until the next watch event.
#[must_use]
pub fn done() -> Action {
    Action::await_change()
}

/// Enqueues after an explicit delay, used when a sub-reconciler requests
/// polling (DNS-TXT recheck, no admitted load-balancer addresses yet).
#[must_use]
pub fn requeue_after(delay: Duration) -> Action {
    Action::requeue(delay)
}

/// Computes how long to wait before requeuing after `err`, the pure
/// decision at the heart of [`error_policy`] (factored out so it's testable
/// without needing a `kube::runtime::controller::Action`).
#[must_use]
pub fn backoff_duration(err: &GlbcError) -> Duration {
    let base = Duration::from_secs(ERROR_REQUEUE_DURATION_SECS);
    if err.is_retryable() {
        base
    } else {
        base * INVARIANT_VIOLATION_BACKOFF_MULTIPLIER as u32
    }
}

/// Shared `error_policy` body for every controller in the process.
///
/// Retryable errors (the default for every [`GlbcError`] variant except
/// [`GlbcError::InvariantViolation`]) are requeued after the standard error
/// backoff window; non-retryable errors back off an order of magnitude
/// further so a persistently broken object doesn't spin the worker pool.
pub fn error_policy<K>(
    resource_type: &'static str,
    _obj: Arc<K>,
    err: &GlbcError,
    _ctx: Arc<Context>,
) -> Action {
    warn!(resource_type, error = %err, "reconcile failed, requeuing");
    metrics::record_reconciliation_error(resource_type, Duration::ZERO);
    requeue_after(backoff_duration(err))
}

#[path = "dispatch_tests.rs"]
#[cfg(test)]
mod dispatch_tests;
