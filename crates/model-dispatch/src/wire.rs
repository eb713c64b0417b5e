//! Wire types for the hosted chat-completions endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::conversation::ConversationTurn;

/// Request body for one completion attempt.
///
/// Auxiliary sampling parameters are fixed: `top_p = 1.0`,
/// `frequency_penalty = 0`, `presence_penalty = 0`.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ConversationTurn>,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
}

impl CompletionRequest {
    pub fn new(
        model: impl Into<String>,
        messages: Vec<ConversationTurn>,
        max_tokens: u32,
        temperature: f64,
    ) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens,
            temperature,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

/// Parsed success body.
///
/// Treated as opaque beyond the fields needed to pull out the generated
/// text; unrecognized fields ride along in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatCompletion {
    /// Content of the first choice, if the backend returned one.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub message: AssistantMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// Token accounting reported by the backend, when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use serde_json::json;

    #[test]
    fn request_carries_fixed_aux_params() {
        let request = CompletionRequest::new(
            "deepseek/deepseek-r1-0528:free",
            vec![ConversationTurn::user("hi")],
            1800,
            0.1,
        );
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "deepseek/deepseek-r1-0528:free");
        assert_eq!(body["max_tokens"], 1800);
        assert_eq!(body["top_p"], 1.0);
        assert_eq!(body["frequency_penalty"], 0.0);
        assert_eq!(body["presence_penalty"], 0.0);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn role_serializes_lowercase() {
        let turn = ConversationTurn::new(Role::System, "preamble");
        let body = serde_json::to_value(&turn).unwrap();
        assert_eq!(body["role"], "system");
    }

    #[test]
    fn completion_deserializes_and_yields_first_content() {
        let body = json!({
            "id": "gen-123",
            "model": "deepseek/deepseek-r1-0528:free",
            "choices": [
                {"message": {"role": "assistant", "content": "hello"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15},
            "provider": "SomeHost"
        });
        let completion: ChatCompletion = serde_json::from_value(body).unwrap();
        assert_eq!(completion.first_content(), Some("hello"));
        assert_eq!(completion.usage.as_ref().unwrap().total_tokens, 15);
        // Unknown fields are preserved, not dropped.
        assert_eq!(completion.extra["provider"], "SomeHost");
    }

    #[test]
    fn completion_without_choices_has_no_content() {
        let completion: ChatCompletion = serde_json::from_value(json!({})).unwrap();
        assert_eq!(completion.first_content(), None);
    }
}
