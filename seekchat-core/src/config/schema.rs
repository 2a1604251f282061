//! Client configuration file schema

use super::error::FieldError;
use super::secrets::SecretString;
use serde::{Deserialize, Serialize};

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("seekchat/", env!("CARGO_PKG_VERSION"));

/// Connection and credential settings for a [`crate::ChatClient`].
///
/// There is no request timeout: streams stay open as long as
/// the server writes, and callers bound them through cancellation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the API; `/chat/completions` is appended
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (supports `${ENV_VAR}` interpolation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,

    /// Preferred model id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// User agent header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Idle connections kept per host
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle_per_host: usize,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_pool_max_idle() -> usize {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: None,
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
            pool_max_idle_per_host: default_pool_max_idle(),
        }
    }
}

impl ClientConfig {
    /// Check field constraints
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.base_url.trim().is_empty() {
            return Err(FieldError::required("base_url"));
        }
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| FieldError::invalid_url("base_url", e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FieldError::invalid_url(
                "base_url",
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(FieldError::out_of_range(
                "connect_timeout_secs",
                "must be greater than zero",
            ));
        }

        if self.user_agent.trim().is_empty() {
            return Err(FieldError::required("user_agent"));
        }

        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err(FieldError::required("model"));
            }
        }

        Ok(())
    }

    /// Full URL of the chat-completions endpoint
    pub fn chat_endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
