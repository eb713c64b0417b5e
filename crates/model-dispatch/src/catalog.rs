//! Candidate catalog: backend models and their per-category fallback order.
//!
//! ## Ordering policy
//!
//! | Category  | Order                                        |
//! |-----------|----------------------------------------------|
//! | Reasoning | primary → reasoning fallback → final fallback |
//! | Coding    | primary → coding fallback → final fallback    |
//!
//! Both orders share the same primary head; they differ only in which
//! fallbacks follow it. The order is fixed at construction and never
//! randomized or reordered between calls.
//!
//! The catalog is an explicit value handed to the dispatcher, so tests can
//! substitute fake candidates. `Default` carries the production free-tier
//! catalog, with model ids overridable through environment variables.

use std::env;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Environment-variable names for model-id overrides.
const ENV_PRIMARY_MODEL: &str = "DISPATCH_PRIMARY_MODEL";
const ENV_REASONING_FALLBACK_MODEL: &str = "DISPATCH_REASONING_FALLBACK_MODEL";
const ENV_CODING_FALLBACK_MODEL: &str = "DISPATCH_CODING_FALLBACK_MODEL";
const ENV_FINAL_FALLBACK_MODEL: &str = "DISPATCH_FINAL_FALLBACK_MODEL";

/// Production free-tier defaults.
const DEFAULT_PRIMARY_MODEL: &str = "deepseek/deepseek-r1-0528:free";
const DEFAULT_REASONING_FALLBACK_MODEL: &str = "qwen/qwen3-30b-a3b:free";
const DEFAULT_CODING_FALLBACK_MODEL: &str = "qwen/qwen-2.5-coder-32b-instruct:free";
const DEFAULT_FINAL_FALLBACK_MODEL: &str = "qwen/qwen3-coder:free";

/// Output-token ceiling shared by every default candidate.
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1800;

/// Task flavor used to select the fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Reasoning,
    Coding,
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reasoning => write!(f, "reasoning"),
            Self::Coding => write!(f, "coding"),
        }
    }
}

/// One configured backend model with its own token ceilings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCandidate {
    /// Hosted model identifier (e.g. `deepseek/deepseek-r1-0528:free`).
    pub id: String,
    /// Hard ceiling on generated tokens, regardless of what the caller asks for.
    pub max_output_tokens: u32,
    /// Maximum estimated input size this candidate is assumed to accept.
    pub context_budget_tokens: u64,
}

impl ModelCandidate {
    pub fn new(id: impl Into<String>, max_output_tokens: u32, context_budget_tokens: u64) -> Self {
        Self {
            id: id.into(),
            max_output_tokens,
            context_budget_tokens,
        }
    }

    /// Output cap actually sent for this candidate: `min(requested, own ceiling)`.
    pub fn effective_output_cap(&self, requested: u32) -> u32 {
        requested.min(self.max_output_tokens)
    }
}

/// Immutable ordered candidate lists, one per task category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateCatalog {
    reasoning: Vec<ModelCandidate>,
    coding: Vec<ModelCandidate>,
}

impl CandidateCatalog {
    pub fn new(reasoning: Vec<ModelCandidate>, coding: Vec<ModelCandidate>) -> Self {
        Self { reasoning, coding }
    }

    /// The fixed attempt order for `category`.
    pub fn order_for(&self, category: TaskCategory) -> &[ModelCandidate] {
        match category {
            TaskCategory::Reasoning => &self.reasoning,
            TaskCategory::Coding => &self.coding,
        }
    }

    /// Every distinct candidate across both orders, first occurrence wins.
    pub fn distinct_candidates(&self) -> Vec<&ModelCandidate> {
        let mut seen: Vec<&ModelCandidate> = Vec::new();
        for candidate in self.reasoning.iter().chain(self.coding.iter()) {
            if !seen.iter().any(|c| c.id == candidate.id) {
                seen.push(candidate);
            }
        }
        seen
    }

    /// Validate the catalog; return an error string if invalid.
    pub fn validate(&self) -> Result<(), String> {
        for (name, order) in [("reasoning", &self.reasoning), ("coding", &self.coding)] {
            if order.is_empty() {
                return Err(format!("{name} candidate order must not be empty"));
            }
            for (i, candidate) in order.iter().enumerate() {
                if order[..i].iter().any(|c| c.id == candidate.id) {
                    return Err(format!(
                        "duplicate candidate '{}' in {name} order",
                        candidate.id
                    ));
                }
            }
        }
        if self.reasoning[0].id != self.coding[0].id {
            return Err(format!(
                "both orders must share the same primary candidate (got '{}' and '{}')",
                self.reasoning[0].id, self.coding[0].id
            ));
        }
        Ok(())
    }
}

impl Default for CandidateCatalog {
    fn default() -> Self {
        let primary = ModelCandidate::new(
            env::var(ENV_PRIMARY_MODEL).unwrap_or_else(|_| DEFAULT_PRIMARY_MODEL.to_string()),
            DEFAULT_MAX_OUTPUT_TOKENS,
            128_000,
        );
        let reasoning_fallback = ModelCandidate::new(
            env::var(ENV_REASONING_FALLBACK_MODEL)
                .unwrap_or_else(|_| DEFAULT_REASONING_FALLBACK_MODEL.to_string()),
            DEFAULT_MAX_OUTPUT_TOKENS,
            130_000,
        );
        let coding_fallback = ModelCandidate::new(
            env::var(ENV_CODING_FALLBACK_MODEL)
                .unwrap_or_else(|_| DEFAULT_CODING_FALLBACK_MODEL.to_string()),
            DEFAULT_MAX_OUTPUT_TOKENS,
            128_000,
        );
        let final_fallback = ModelCandidate::new(
            env::var(ENV_FINAL_FALLBACK_MODEL)
                .unwrap_or_else(|_| DEFAULT_FINAL_FALLBACK_MODEL.to_string()),
            DEFAULT_MAX_OUTPUT_TOKENS,
            127_000,
        );

        Self::new(
            vec![
                primary.clone(),
                reasoning_fallback,
                final_fallback.clone(),
            ],
            vec![primary, coding_fallback, final_fallback],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_validates() {
        let catalog = CandidateCatalog::default();
        catalog.validate().expect("default catalog should be valid");
    }

    #[test]
    fn orders_share_primary_head() {
        let catalog = CandidateCatalog::default();
        assert_eq!(
            catalog.order_for(TaskCategory::Reasoning)[0].id,
            catalog.order_for(TaskCategory::Coding)[0].id,
        );
    }

    #[test]
    fn orders_diverge_after_primary() {
        let catalog = CandidateCatalog::default();
        let reasoning = catalog.order_for(TaskCategory::Reasoning);
        let coding = catalog.order_for(TaskCategory::Coding);
        assert_eq!(reasoning.len(), 3);
        assert_eq!(coding.len(), 3);
        assert_ne!(reasoning[1].id, coding[1].id);
        assert_eq!(reasoning[2].id, coding[2].id);
    }

    #[test]
    fn effective_cap_never_exceeds_ceiling() {
        let candidate = ModelCandidate::new("m", 1800, 128_000);
        assert_eq!(candidate.effective_output_cap(4000), 1800);
        assert_eq!(candidate.effective_output_cap(1800), 1800);
        assert_eq!(candidate.effective_output_cap(100), 100);
    }

    #[test]
    fn distinct_candidates_dedupe_by_id() {
        let catalog = CandidateCatalog::default();
        // 3 + 3 entries, primary and final fallback shared.
        assert_eq!(catalog.distinct_candidates().len(), 4);
    }

    #[test]
    fn empty_order_rejected() {
        let catalog = CandidateCatalog::new(vec![], vec![ModelCandidate::new("m", 1, 1)]);
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn duplicate_candidate_rejected() {
        let m = ModelCandidate::new("m", 1, 1);
        let catalog = CandidateCatalog::new(vec![m.clone(), m.clone()], vec![m]);
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn mismatched_primary_rejected() {
        let catalog = CandidateCatalog::new(
            vec![ModelCandidate::new("a", 1, 1)],
            vec![ModelCandidate::new("b", 1, 1)],
        );
        assert!(catalog.validate().is_err());
    }
}
