//! Structured observability hook for dispatch attempts.
//!
//! The dispatcher emits one [`DispatchEvent`] per attempt lifecycle point
//! through an injectable [`AttemptObserver`], decoupled from any particular
//! output sink. The default sink forwards to `tracing`.

use std::sync::Arc;

use serde::Serialize;

use crate::error::FailureKind;

/// Lifecycle events emitted by the fallback loop.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum DispatchEvent {
    /// A candidate attempt is about to be issued.
    AttemptStarted {
        model: String,
        /// 1-based attempt index.
        attempt: usize,
        /// Length of the candidate order for this dispatch.
        total: usize,
    },
    /// The attempt failed; the loop advances to the next candidate.
    AttemptFailed {
        model: String,
        attempt: usize,
        kind: FailureKind,
        reason: String,
    },
    /// The attempt succeeded and the loop terminated.
    AttemptSucceeded {
        model: String,
        attempt: usize,
        used_fallback: bool,
    },
    /// Every candidate failed.
    Exhausted { attempts: usize, last_error: String },
}

/// Sink for dispatch events.
///
/// Implementations must be cheap and non-blocking; the dispatcher calls
/// them inline between attempts.
pub trait AttemptObserver: Send + Sync {
    fn on_event(&self, event: &DispatchEvent);
}

impl<T: AttemptObserver + ?Sized> AttemptObserver for Arc<T> {
    fn on_event(&self, event: &DispatchEvent) {
        (**self).on_event(event);
    }
}

/// Default observer: forwards events to `tracing` with structured fields.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl AttemptObserver for TracingObserver {
    fn on_event(&self, event: &DispatchEvent) {
        match event {
            DispatchEvent::AttemptStarted {
                model,
                attempt,
                total,
            } => {
                tracing::info!(model = %model, attempt = *attempt, total = *total, "trying candidate");
            }
            DispatchEvent::AttemptFailed {
                model,
                attempt,
                kind,
                reason,
            } => {
                tracing::warn!(model = %model, attempt = *attempt, kind = %kind, reason = %reason, "candidate failed");
            }
            DispatchEvent::AttemptSucceeded {
                model,
                attempt,
                used_fallback,
            } => {
                if *used_fallback {
                    tracing::warn!(model = %model, attempt = *attempt, "fallback candidate answered");
                } else {
                    tracing::info!(model = %model, attempt = *attempt, "primary candidate answered");
                }
            }
            DispatchEvent::Exhausted {
                attempts,
                last_error,
            } => {
                tracing::error!(attempts = *attempts, last_error = %last_error, "all candidates failed");
            }
        }
    }
}

/// Observer that drops every event.
#[derive(Debug, Default)]
pub struct NullObserver;

impl AttemptObserver for NullObserver {
    fn on_event(&self, _event: &DispatchEvent) {}
}
