//! HTTP transport for completion attempts.
//!
//! `CompletionTransport` is the seam between the fallback loop and the
//! network. Production uses [`HttpTransport`] over reqwest; tests inject
//! scripted implementations so no endpoint is needed.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::config::DispatchConfig;
use crate::error::{DispatchError, TransportError};
use crate::wire::{ChatCompletion, CompletionRequest};

/// One network attempt against the hosted endpoint.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn execute(&self, request: CompletionRequest) -> Result<ChatCompletion, TransportError>;
}

#[async_trait]
impl<T: CompletionTransport + ?Sized> CompletionTransport for Arc<T> {
    async fn execute(&self, request: CompletionRequest) -> Result<ChatCompletion, TransportError> {
        (**self).execute(request).await
    }
}

/// Production transport: one POST per attempt with bearer auth and
/// application-identifying headers.
///
/// The client (and its timeout) is built once and reused across attempts.
pub struct HttpTransport {
    client: reqwest::Client,
    chat_url: String,
    api_key: String,
    referer: String,
    app_title: String,
}

impl HttpTransport {
    /// Build from config. An absent credential is carried as an empty bearer
    /// token; the dispatcher gates on the credential before any attempt, so
    /// this transport never runs without one in practice.
    pub fn new(config: &DispatchConfig) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                DispatchError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            chat_url: config.chat_url(),
            api_key: config.api_key.clone().unwrap_or_default(),
            referer: config.referer.clone(),
            app_title: config.app_title.clone(),
        })
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn execute(&self, request: CompletionRequest) -> Result<ChatCompletion, TransportError> {
        let response = self
            .client
            .post(&self.chat_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.app_title)
            .json(&request)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<ChatCompletion>()
            .await
            .map_err(|e| TransportError::MalformedBody(e.to_string()))
    }
}

fn classify_send_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(err.to_string())
    }
}
