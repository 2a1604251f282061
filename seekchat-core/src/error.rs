//! Error types for chat calls
//!
//! Cancellation is not part of this taxonomy: a cancelled
//! stream settles as [`crate::client::StreamOutcome::Cancelled`].

use crate::config::ConfigError;
use thiserror::Error;

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Request problems detected before any network I/O
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No API key is configured
    #[error("API key is not set, configure it in the settings")]
    MissingCredential,

    /// The request carries no messages
    #[error("messages must not be empty")]
    EmptyMessages,
}

/// Errors surfaced by the chat client
#[derive(Debug, Error)]
pub enum ChatError {
    /// Rejected before the request was sent
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Non-2xx response; `body` is the raw response text
    #[error("API error: {status} {status_text} - {body}")]
    Api {
        status: u16,
        status_text: String,
        body: String,
    },

    /// A non-streaming response body could not be decoded
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Network-level failure unrelated to cancellation
    #[error("Transport error: {0}")]
    Transport(String),

    /// The model asked for a capability that is not registered
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The accumulated argument string of a tool call is not valid JSON
    #[error("Invalid arguments for tool '{name}': {message}")]
    ToolArguments { name: String, message: String },

    /// A registered handler returned an error
    #[error("Tool '{name}' failed: {message}")]
    ToolFailed { name: String, message: String },

    /// Reading or writing settings failed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ChatError {
    /// Create an API error from a status line and raw body
    pub fn api(status: u16, status_text: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    /// True for errors raised before any network I/O
    pub fn is_validation(&self) -> bool {
        matches!(self, ChatError::Validation(_))
    }

    /// True when the user has to visit the settings to fix the error
    pub fn requires_configuration(&self) -> bool {
        matches!(
            self,
            ChatError::Validation(ValidationError::MissingCredential)
        )
    }

    /// HTTP status for API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            ChatError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            ChatError::Transport(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            ChatError::Parse(err.to_string())
        } else {
            ChatError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_requires_configuration() {
        let err = ChatError::from(ValidationError::MissingCredential);
        assert!(err.is_validation());
        assert!(err.requires_configuration());

        let err = ChatError::from(ValidationError::EmptyMessages);
        assert!(err.is_validation());
        assert!(!err.requires_configuration());
    }

    #[test]
    fn test_api_error_message_keeps_raw_body() {
        let err = ChatError::api(401, "Unauthorized", "{\"error\":\"bad key\"}");
        assert_eq!(err.status(), Some(401));
        assert_eq!(
            err.to_string(),
            "API error: 401 Unauthorized - {\"error\":\"bad key\"}"
        );
    }
}
