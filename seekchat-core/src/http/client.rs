//! HTTP transport implementation using reqwest

use crate::cancel::CancellationToken;
use crate::config::{ClientConfig, DEFAULT_USER_AGENT};
use crate::error::{ChatError, ChatResult};
use crate::http::error::{map_http_error, map_send_error};
use crate::http::{ByteStream, Transport, TransportRequest};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Shared HTTP client with connection pooling
#[derive(Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> ChatResult<Self> {
        Self::with_config(Duration::from_secs(10), DEFAULT_USER_AGENT, 10)
    }

    /// Create a client from a loaded [`ClientConfig`]
    pub fn from_config(config: &ClientConfig) -> ChatResult<Self> {
        Self::with_config(
            Duration::from_secs(config.connect_timeout_secs),
            &config.user_agent,
            config.pool_max_idle_per_host,
        )
    }

    /// Create a new HTTP client with custom configuration.
    ///
    /// Only the connect phase is bounded; an open stream is never timed out.
    pub fn with_config(
        connect_timeout: Duration,
        user_agent: &str,
        max_idle_per_host: usize,
    ) -> ChatResult<Self> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(connect_timeout)
            .user_agent(user_agent)
            .gzip(true)
            .build()
            .map_err(|e| ChatError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn open(
        &self,
        request: TransportRequest,
        cancel: &CancellationToken,
    ) -> ChatResult<Option<ByteStream>> {
        request.validate()?;

        let request_id = request.request_id;
        if cancel.is_cancelled() {
            info!("Request cancelled before sending [request_id: {}]", request_id);
            return Ok(None);
        }

        let accept = if request.is_streaming() {
            "text/event-stream"
        } else {
            "application/json"
        };

        info!(
            "Sending chat request with key {} [request_id: {}]",
            request.api_key.partial_redact(),
            request_id
        );
        debug!("Request URL: {}", request.endpoint);

        let send = self
            .client
            .post(&request.endpoint)
            .bearer_auth(request.api_key.expose_secret())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, accept)
            .header("X-Request-ID", request_id.to_string())
            .json(&request.body)
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Request cancelled while awaiting response [request_id: {}]", request_id);
                return Ok(None);
            }
            result = send => match result {
                Ok(response) => response,
                Err(e) if cancel.is_cancelled() => {
                    debug!("Send error after cancellation ignored: {} [request_id: {}]", e, request_id);
                    return Ok(None);
                }
                Err(e) => {
                    error!("Request error [request_id: {}]: {}", request_id, e);
                    return Err(map_send_error(e, request_id));
                }
            },
        };

        let status = response.status();
        debug!("Response status: {} [request_id: {}]", status, request_id);

        if !status.is_success() {
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Request cancelled while reading error body [request_id: {}]", request_id);
                    return Ok(None);
                }
                body = response.text() => body.ok(),
            };
            if cancel.is_cancelled() {
                return Ok(None);
            }
            warn!(
                "Request failed with status {} [request_id: {}]",
                status, request_id
            );
            return Err(map_http_error(status, body));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ChatError::from));
        Ok(Some(Box::pin(stream)))
    }
}
