//! Dispatch error taxonomy with failure classification.
//!
//! Callers query `kind()` instead of string matching. Every per-attempt
//! failure is swallowed into the next-candidate decision; only the terminal
//! kinds in [`DispatchError`] reach the dispatcher's caller.
//!
//! ## Failure kinds
//!
//! | Kind         | Examples                                  | Loop action |
//! |--------------|-------------------------------------------|-------------|
//! | Transient    | HTTP 404/429/502/503, timeout, no connect | advance     |
//! | Unclassified | any other non-2xx, undecodable body       | advance     |
//!
//! Unclassified failures advance too: one backend's response says nothing
//! about another backend's availability. The trade-off is that a malformed
//! request recurs identically against every candidate and only surfaces as
//! exhaustion.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// How a failed attempt is interpreted by the fallback loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Candidate-local unavailability — rate limit, gateway failure,
    /// timeout, connect failure, or a delisted model id.
    Transient,
    /// Any other non-success outcome.
    Unclassified,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Unclassified => write!(f, "unclassified"),
        }
    }
}

/// Transport-level outcome of a single candidate attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The attempt exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection or other transport-level failure before a response arrived.
    #[error("network failure: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A 2xx response whose body did not decode as a chat completion.
    #[error("malformed response body: {0}")]
    MalformedBody(String),
}

impl TransportError {
    /// Status codes treated as candidate-local unavailability. 404 is here
    /// because the hosted catalog routinely delists free-tier models; a
    /// missing id on one backend says nothing about the next candidate.
    const TRANSIENT_STATUSES: [u16; 4] = [404, 429, 502, 503];

    /// Classify this failure for the fallback loop.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout | Self::Network(_) => FailureKind::Transient,
            Self::Status { status, .. } if Self::TRANSIENT_STATUSES.contains(status) => {
                FailureKind::Transient
            }
            Self::Status { .. } | Self::MalformedBody(_) => FailureKind::Unclassified,
        }
    }
}

/// One recorded failure in the fallback trail.
#[derive(Debug, Clone)]
pub struct AttemptFailure {
    /// Candidate id that failed.
    pub model: String,
    /// 1-based attempt index within the dispatch call.
    pub attempt: usize,
    pub kind: FailureKind,
    pub reason: String,
}

/// Terminal errors surfaced to the dispatcher's caller.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Required credential missing — raised before any network attempt.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Every candidate in the order failed.
    #[error("all {attempts} candidate(s) failed; last error: {last_error}")]
    Exhausted {
        attempts: usize,
        last_error: String,
        /// Per-candidate failures in attempt order.
        trail: Vec<AttemptFailure>,
    },
}
