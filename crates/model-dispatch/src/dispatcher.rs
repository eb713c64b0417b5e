//! The ordered-fallback dispatch loop.
//!
//! Free-tier hosted models are individually unreliable (rate limits,
//! temporary unavailability) and have heterogeneous context windows. The
//! dispatcher masks single-backend flakiness behind a short, deterministic
//! retry chain: attempts are bounded by the length of the candidate order,
//! and no candidate is attempted more than once per dispatch call.
//!
//! ## Per-attempt lifecycle
//!
//! ```text
//! dispatch(conversation, category, max_tokens, temperature)
//!   → credential gate                 — fail before any attempt if unset
//!   → for each candidate in order:
//!       clamp output cap              — min(requested, candidate ceiling)
//!       fit conversation to budget    — lossy head/tail reduction if needed
//!       POST once, classify outcome   — success returns; any failure is
//!                                       recorded and the loop advances
//!   → exhaustion                      — last reason + full per-candidate trail
//! ```
//!
//! Attempts are strictly sequential — no speculative racing of backends.
//! The dispatcher holds no cross-call mutable state; concurrent callers
//! simply issue independent dispatch calls.

use crate::catalog::{CandidateCatalog, ModelCandidate, TaskCategory};
use crate::config::{DispatchConfig, ENV_API_KEY};
use crate::conversation::{fit_within_budget, ConversationTurn};
use crate::error::{AttemptFailure, DispatchError, TransportError};
use crate::observer::{AttemptObserver, DispatchEvent, TracingObserver};
use crate::transport::{CompletionTransport, HttpTransport};
use crate::wire::{ChatCompletion, CompletionRequest};

/// Successful dispatch outcome with bookkeeping.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    /// Parsed response body from the candidate that answered.
    pub payload: ChatCompletion,
    /// The candidate that served the request.
    pub candidate: ModelCandidate,
    /// 1-based index of the attempt that succeeded.
    pub attempt_index: usize,
    /// `false` iff the primary (first) candidate answered.
    pub used_fallback: bool,
}

impl CallOutcome {
    /// Generated text of the first choice, if any.
    pub fn content(&self) -> Option<&str> {
        self.payload.first_content()
    }
}

/// Ordered-fallback dispatcher over a candidate catalog.
pub struct Dispatcher {
    config: DispatchConfig,
    catalog: CandidateCatalog,
    transport: Box<dyn CompletionTransport>,
    observer: Box<dyn AttemptObserver>,
}

impl Dispatcher {
    /// Build with an explicit config, catalog, and transport. Events go to
    /// the default tracing observer; override with [`Self::with_observer`].
    pub fn new(
        config: DispatchConfig,
        catalog: CandidateCatalog,
        transport: Box<dyn CompletionTransport>,
    ) -> Self {
        Self {
            config,
            catalog,
            transport,
            observer: Box::new(TracingObserver),
        }
    }

    /// Production construction: config from the environment, default
    /// catalog, reqwest transport.
    pub fn from_env() -> Result<Self, DispatchError> {
        let config = DispatchConfig::from_env();
        config.validate().map_err(DispatchError::Configuration)?;
        let catalog = CandidateCatalog::default();
        catalog.validate().map_err(DispatchError::Configuration)?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(config, catalog, Box::new(transport)))
    }

    pub fn with_observer(mut self, observer: Box<dyn AttemptObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CandidateCatalog {
        &self.catalog
    }

    /// Issue one logical call, walking the candidate order for `category`
    /// until a candidate answers or the order is exhausted.
    ///
    /// # Errors
    ///
    /// `DispatchError::Configuration` if the credential is unset (no attempt
    /// is made), `DispatchError::Exhausted` when every candidate failed.
    pub async fn dispatch(
        &self,
        conversation: &[ConversationTurn],
        category: TaskCategory,
        requested_max_output_tokens: u32,
        temperature: f64,
    ) -> Result<CallOutcome, DispatchError> {
        self.require_credential()?;

        let order = self.catalog.order_for(category);
        let total = order.len();
        let mut trail: Vec<AttemptFailure> = Vec::with_capacity(total);

        for (i, candidate) in order.iter().enumerate() {
            let attempt = i + 1;
            self.observer.on_event(&DispatchEvent::AttemptStarted {
                model: candidate.id.clone(),
                attempt,
                total,
            });

            match self
                .attempt(candidate, conversation, requested_max_output_tokens, temperature)
                .await
            {
                Ok(payload) => {
                    let used_fallback = i > 0;
                    self.observer.on_event(&DispatchEvent::AttemptSucceeded {
                        model: candidate.id.clone(),
                        attempt,
                        used_fallback,
                    });
                    return Ok(CallOutcome {
                        payload,
                        candidate: candidate.clone(),
                        attempt_index: attempt,
                        used_fallback,
                    });
                }
                Err(err) => {
                    let failure = AttemptFailure {
                        model: candidate.id.clone(),
                        attempt,
                        kind: err.kind(),
                        reason: err.to_string(),
                    };
                    self.observer.on_event(&DispatchEvent::AttemptFailed {
                        model: failure.model.clone(),
                        attempt,
                        kind: failure.kind,
                        reason: failure.reason.clone(),
                    });
                    trail.push(failure);
                }
            }
        }

        let last_error = trail
            .last()
            .map(|f| f.reason.clone())
            .unwrap_or_else(|| "no candidates configured".to_string());
        self.observer.on_event(&DispatchEvent::Exhausted {
            attempts: trail.len(),
            last_error: last_error.clone(),
        });
        Err(DispatchError::Exhausted {
            attempts: trail.len(),
            last_error,
            trail,
        })
    }

    /// One attempt against a single candidate — no fallback. Also used by
    /// the preflight probe.
    pub(crate) async fn attempt(
        &self,
        candidate: &ModelCandidate,
        conversation: &[ConversationTurn],
        requested_max_output_tokens: u32,
        temperature: f64,
    ) -> Result<ChatCompletion, TransportError> {
        let messages = fit_within_budget(conversation, candidate.context_budget_tokens);
        let request = CompletionRequest::new(
            candidate.id.clone(),
            messages.into_owned(),
            candidate.effective_output_cap(requested_max_output_tokens),
            temperature,
        );
        self.transport.execute(request).await
    }

    pub(crate) fn require_credential(&self) -> Result<(), DispatchError> {
        match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(()),
            _ => Err(DispatchError::Configuration(format!(
                "{ENV_API_KEY} is not set"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockCompletionTransport;
    use serde_json::json;

    fn completion(content: &str) -> ChatCompletion {
        serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        }))
        .unwrap()
    }

    fn single_candidate_catalog(candidate: ModelCandidate) -> CandidateCatalog {
        CandidateCatalog::new(vec![candidate.clone()], vec![candidate])
    }

    fn keyed_config() -> DispatchConfig {
        DispatchConfig::default().with_api_key("test-key")
    }

    #[tokio::test]
    async fn output_cap_clamped_to_candidate_ceiling() {
        let candidate = ModelCandidate::new("m", 100, 128_000);
        let mut transport = MockCompletionTransport::new();
        transport
            .expect_execute()
            .withf(|request| request.max_tokens == 100)
            .times(1)
            .returning(|_| Ok(completion("ok")));

        let dispatcher = Dispatcher::new(
            keyed_config(),
            single_candidate_catalog(candidate),
            Box::new(transport),
        );
        let outcome = dispatcher
            .dispatch(
                &[ConversationTurn::user("hi")],
                TaskCategory::Coding,
                4000,
                0.1,
            )
            .await
            .unwrap();
        assert_eq!(outcome.attempt_index, 1);
        assert!(!outcome.used_fallback);
    }

    #[tokio::test]
    async fn requested_cap_below_ceiling_passes_through() {
        let candidate = ModelCandidate::new("m", 1800, 128_000);
        let mut transport = MockCompletionTransport::new();
        transport
            .expect_execute()
            .withf(|request| request.max_tokens == 64)
            .times(1)
            .returning(|_| Ok(completion("ok")));

        let dispatcher = Dispatcher::new(
            keyed_config(),
            single_candidate_catalog(candidate),
            Box::new(transport),
        );
        dispatcher
            .dispatch(&[ConversationTurn::user("hi")], TaskCategory::Coding, 64, 0.1)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn under_budget_conversation_transmitted_verbatim() {
        let candidate = ModelCandidate::new("m", 1800, 128_000);
        let conversation = vec![
            ConversationTurn::system("be brief"),
            ConversationTurn::user("hello"),
            ConversationTurn::assistant("hi"),
            ConversationTurn::user("and?"),
        ];
        let expected = conversation.clone();
        let mut transport = MockCompletionTransport::new();
        transport
            .expect_execute()
            .withf(move |request| request.messages == expected)
            .times(1)
            .returning(|_| Ok(completion("ok")));

        let dispatcher = Dispatcher::new(
            keyed_config(),
            single_candidate_catalog(candidate),
            Box::new(transport),
        );
        dispatcher
            .dispatch(&conversation, TaskCategory::Reasoning, 1800, 0.1)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_credential_makes_no_attempt() {
        let candidate = ModelCandidate::new("m", 1800, 128_000);
        let mut transport = MockCompletionTransport::new();
        transport.expect_execute().times(0);

        let dispatcher = Dispatcher::new(
            DispatchConfig::default(),
            single_candidate_catalog(candidate),
            Box::new(transport),
        );
        let err = dispatcher
            .dispatch(&[ConversationTurn::user("hi")], TaskCategory::Coding, 1800, 0.1)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Configuration(_)));
    }

    #[tokio::test]
    async fn unclassified_failure_still_advances() {
        let primary = ModelCandidate::new("primary", 1800, 128_000);
        let fallback = ModelCandidate::new("fallback", 1800, 128_000);
        let catalog = CandidateCatalog::new(
            vec![primary.clone(), fallback.clone()],
            vec![primary, fallback],
        );

        let mut transport = MockCompletionTransport::new();
        let mut seq = mockall::Sequence::new();
        transport
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Err(TransportError::Status {
                    status: 400,
                    body: "bad request".into(),
                })
            });
        transport
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(completion("recovered")));

        let dispatcher = Dispatcher::new(keyed_config(), catalog, Box::new(transport));
        let outcome = dispatcher
            .dispatch(&[ConversationTurn::user("hi")], TaskCategory::Coding, 1800, 0.1)
            .await
            .unwrap();
        assert_eq!(outcome.attempt_index, 2);
        assert!(outcome.used_fallback);
        assert_eq!(outcome.content(), Some("recovered"));
    }
}
