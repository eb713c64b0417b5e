//! Dispatcher configuration: credential, endpoint, identifying headers.
//!
//! The credential is read from the process environment exactly once, in
//! [`DispatchConfig::from_env`], and carried as an explicit field from then
//! on. A missing credential is not an error at construction time; dispatch
//! fails with a configuration error before any network attempt is made.

use std::env;
use std::time::Duration;

/// Environment variable holding the bearer credential.
pub(crate) const ENV_API_KEY: &str = "OPENROUTER_KEY";
/// Optional base-URL override (e.g. a self-hosted proxy).
const ENV_BASE_URL: &str = "DISPATCH_BASE_URL";

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// `HTTP-Referer` / `X-Title` defaults identifying the calling application.
const DEFAULT_REFERER: &str = "https://multiverse-ai.com";
const DEFAULT_APP_TITLE: &str = "Multiverse AI Web Builder";

/// Default requested output-token cap (clamped per candidate on dispatch).
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1800;
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.1;

/// Explicit configuration handed to the dispatcher at construction.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Bearer credential. `None` makes dispatch fail before any attempt.
    pub api_key: Option<String>,
    /// Base URL of the hosted API (no trailing path).
    pub base_url: String,
    /// `HTTP-Referer` header value sent with every request.
    pub referer: String,
    /// `X-Title` header value sent with every request.
    pub app_title: String,
    /// Transport timeout per attempt. A timed-out attempt is treated as a
    /// transient failure and the loop advances.
    pub timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            app_title: DEFAULT_APP_TITLE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl DispatchConfig {
    /// Build from the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            api_key: env::var(ENV_API_KEY).ok().filter(|k| !k.is_empty()),
            base_url: env::var(ENV_BASE_URL).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Full URL of the chat-completions endpoint.
    pub fn chat_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            CHAT_COMPLETIONS_PATH
        )
    }

    /// Validate the config; return an error string if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!("base_url must be an http(s) URL, got {}", self.base_url));
        }
        if self.timeout.is_zero() {
            return Err("timeout must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        DispatchConfig::default()
            .validate()
            .expect("default config should be valid");
    }

    #[test]
    fn chat_url_joins_without_double_slash() {
        let mut config = DispatchConfig::default();
        config.base_url = "https://openrouter.ai/api/v1/".to_string();
        assert_eq!(config.chat_url(), "https://openrouter.ai/api/v1/chat/completions");
    }

    #[test]
    fn with_api_key_sets_credential() {
        let config = DispatchConfig::default().with_api_key("sk-test");
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn non_http_base_url_rejected() {
        let mut config = DispatchConfig::default();
        config.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut config = DispatchConfig::default();
        config.timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
