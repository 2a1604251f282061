//! HTTP error mapping utilities

use crate::error::ChatError;
use reqwest::StatusCode;
use uuid::Uuid;

/// Map a non-success status and its raw body to a [`ChatError::Api`].
///
/// The body is kept verbatim for diagnostics; it is not parsed.
pub fn map_http_error(status: StatusCode, body: Option<String>) -> ChatError {
    ChatError::Api {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("").to_string(),
        body: body.unwrap_or_default(),
    }
}

/// Map a failure to send the request or read the response head
pub fn map_send_error(err: reqwest::Error, request_id: Uuid) -> ChatError {
    if err.is_connect() {
        ChatError::Transport(format!("Connection failed: {} [request_id: {}]", err, request_id))
    } else if err.is_timeout() {
        ChatError::Transport(format!("Connect timeout: {} [request_id: {}]", err, request_id))
    } else {
        ChatError::Transport(format!("{} [request_id: {}]", err, request_id))
    }
}
