//! HTTP transport for chat-completions calls
//!
//! This module implements the transport layer, handling:
//! - Credential and request validation before any I/O
//! - Bearer authentication and request ID correlation
//! - Mapping non-2xx responses to [`ChatError::Api`]
//! - Exposing the response body as a byte stream that honors cancellation

pub mod client;
pub mod error;

use crate::cancel::CancellationToken;
use crate::config::SecretString;
use crate::error::{ChatResult, ValidationError};
use crate::protocol::ChatRequest;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use uuid::Uuid;

pub use client::HttpClient;

/// Response body as it arrives from the network
pub type ByteStream = Pin<Box<dyn Stream<Item = ChatResult<Bytes>> + Send>>;

/// Everything the transport needs to issue one POST
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Full endpoint URL
    pub endpoint: String,

    /// Bearer credential
    pub api_key: SecretString,

    /// JSON body
    pub body: ChatRequest,

    /// Correlation ID sent as `X-Request-ID`
    pub request_id: Uuid,
}

impl TransportRequest {
    /// Create a request with a fresh request ID
    pub fn new(endpoint: impl Into<String>, api_key: SecretString, body: ChatRequest) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key,
            body,
            request_id: Uuid::new_v4(),
        }
    }

    /// Reject requests that must never reach the network
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.is_blank() {
            return Err(ValidationError::MissingCredential);
        }
        if self.body.messages.is_empty() {
            return Err(ValidationError::EmptyMessages);
        }
        Ok(())
    }

    /// True when the body asks for a server-sent-events response
    pub fn is_streaming(&self) -> bool {
        self.body.stream.unwrap_or(false)
    }
}

/// Opens a response body for a chat-completions request.
///
/// Returns `Ok(None)` when the token was cancelled before a response
/// arrived; no error is surfaced in that case.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(
        &self,
        request: TransportRequest,
        cancel: &CancellationToken,
    ) -> ChatResult<Option<ByteStream>>;
}
