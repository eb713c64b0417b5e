//! Conversation turns and token-budget truncation.
//!
//! ## Design
//!
//! - Token estimation: character count ÷ 4 (fast, provider-agnostic).
//! - Budget fit: a conversation whose estimate exceeds a candidate's context
//!   budget is reduced to at most two turns — the leading turn if its role is
//!   `system`, plus the trailing turn if its role is `user`. Every
//!   intermediate turn is dropped.
//! - Conversations of two turns or fewer pass through unchanged even when
//!   over budget; there is nothing useful left to drop.
//! - The reduction applies only to the transmitted payload. The caller's
//!   turns are never mutated.
//!
//! The estimate is approximate in both directions: it is not reconciled
//! against any backend tokenizer, so budget thresholds are soft.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Characters per estimated token.
const CHARS_PER_TOKEN: usize = 4;

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged turn in a conversation.
///
/// Ordering is meaningful: position determines what survives truncation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Estimate the token footprint of `text`: 1 token ≈ 4 characters.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() / CHARS_PER_TOKEN) as u64
}

/// Total estimated footprint of a conversation.
pub fn conversation_tokens(turns: &[ConversationTurn]) -> u64 {
    turns.iter().map(|t| estimate_tokens(&t.content)).sum()
}

/// Fit `turns` within `budget_tokens`, returning the payload to transmit.
///
/// Borrows the input unchanged when it already fits or has at most two
/// turns. Otherwise returns an owned reduction of at most two turns: the
/// system head and/or the user tail. When the head is not a system turn and
/// the tail is not a user turn, the reduction is empty.
pub fn fit_within_budget(
    turns: &[ConversationTurn],
    budget_tokens: u64,
) -> Cow<'_, [ConversationTurn]> {
    if conversation_tokens(turns) <= budget_tokens || turns.len() <= 2 {
        return Cow::Borrowed(turns);
    }

    let mut kept = Vec::with_capacity(2);
    if let Some(head) = turns.first() {
        if head.role == Role::System {
            kept.push(head.clone());
        }
    }
    if let Some(tail) = turns.last() {
        if tail.role == Role::User {
            kept.push(tail.clone());
        }
    }
    Cow::Owned(kept)
}
