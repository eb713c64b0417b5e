//! Catalog connectivity probe.
//!
//! Probes every distinct candidate with one attempt each — no fallback, so
//! a sick candidate cannot hide behind a healthy one.

use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::conversation::ConversationTurn;
use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;

const PROBE_MAX_OUTPUT_TOKENS: u32 = 16;
const PROBE_TEMPERATURE: f64 = 0.0;

/// Outcome of probing one candidate.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub model: String,
    pub healthy: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health report over every distinct candidate in the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct PreflightReport {
    /// Per-candidate results in catalog order.
    pub results: Vec<ProbeResult>,
    /// RFC 3339 timestamp of when the probe ran.
    pub timestamp: String,
}

impl PreflightReport {
    /// `true` if at least one candidate answered.
    pub fn any_healthy(&self) -> bool {
        self.results.iter().any(|r| r.healthy)
    }

    pub fn healthy_models(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| r.healthy)
            .map(|r| r.model.as_str())
            .collect()
    }
}

fn probe_conversation() -> Vec<ConversationTurn> {
    vec![
        ConversationTurn::system("You are a helpful assistant."),
        ConversationTurn::user("Reply with the single word: ok"),
    ]
}

/// Probe every distinct candidate in the dispatcher's catalog.
///
/// # Errors
///
/// `DispatchError::Configuration` if the credential is unset; individual
/// candidate failures are recorded in the report, not raised.
pub async fn probe_catalog(dispatcher: &Dispatcher) -> Result<PreflightReport, DispatchError> {
    dispatcher.require_credential()?;

    let conversation = probe_conversation();
    let mut results = Vec::new();

    for candidate in dispatcher.catalog().distinct_candidates() {
        let started = Instant::now();
        match dispatcher
            .attempt(
                candidate,
                &conversation,
                PROBE_MAX_OUTPUT_TOKENS,
                PROBE_TEMPERATURE,
            )
            .await
        {
            Ok(_) => {
                info!(model = %candidate.id, "candidate healthy");
                results.push(ProbeResult {
                    model: candidate.id.clone(),
                    healthy: true,
                    latency_ms: started.elapsed().as_millis() as u64,
                    error: None,
                });
            }
            Err(err) => {
                warn!(model = %candidate.id, error = %err, "candidate unhealthy");
                results.push(ProbeResult {
                    model: candidate.id.clone(),
                    healthy: false,
                    latency_ms: started.elapsed().as_millis() as u64,
                    error: Some(err.to_string()),
                });
            }
        }
    }

    Ok(PreflightReport {
        results,
        timestamp: Utc::now().to_rfc3339(),
    })
}
