//! Request orchestration
//!
//! [`ChatClient`] merges caller parameters with [`RequestDefaults`], reads
//! the credential and model from the injected [`ConfigStore`], opens the
//! response through a [`Transport`] and hands every decoded chunk to the
//! caller before routing any completed tool calls. Tool handlers run on
//! detached tasks; a slow or stuck handler never delays the stream.

pub mod defaults;

pub use defaults::RequestDefaults;

use crate::cancel::CancellationToken;
use crate::config::{ClientConfig, ConfigStore, Settings, DEFAULT_BASE_URL};
use crate::error::{ChatError, ChatResult};
use crate::http::{HttpClient, Transport, TransportRequest};
use crate::protocol::{ChatRequest, ChatResponse, ChatStreamChunk, Message, ToolChoice};
use crate::stream::ChunkStream;
use crate::tools::{PendingToolCall, ToolCallAccumulator, ToolRegistry};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// How a streaming call settled when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The server ended the stream
    Completed,
    /// The caller's token stopped the call
    Cancelled,
}

impl StreamOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StreamOutcome::Cancelled)
    }
}

/// Per-call options
#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// Caller-owned cancellation handle
    pub cancel: Option<CancellationToken>,
    /// Attach the registered tool definitions
    pub enable_tools: bool,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            cancel: None,
            enable_tools: true,
        }
    }
}

impl ChatOptions {
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn without_tools(mut self) -> Self {
        self.enable_tools = false;
        self
    }
}

/// Build `[system?, user]`
pub fn create_chat_messages(user: impl Into<String>, system: Option<&str>) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system {
        messages.push(Message::system(system));
    }
    messages.push(Message::user(user));
    messages
}

/// Chat-completions client
pub struct ChatClient {
    transport: Arc<dyn Transport>,
    config: Arc<dyn ConfigStore>,
    tools: Arc<ToolRegistry>,
    endpoint: String,
    defaults: RequestDefaults,
}

impl ChatClient {
    pub fn new(transport: Arc<dyn Transport>, config: Arc<dyn ConfigStore>) -> Self {
        Self {
            transport,
            config,
            tools: Arc::new(ToolRegistry::new()),
            endpoint: endpoint_for(DEFAULT_BASE_URL),
            defaults: RequestDefaults::default(),
        }
    }

    /// Client over an [`HttpClient`] built from a loaded file configuration
    pub fn from_config(config: &ClientConfig, store: Arc<dyn ConfigStore>) -> ChatResult<Self> {
        let transport = HttpClient::from_config(config)?;
        Ok(Self::new(Arc::new(transport), store).with_base_url(&config.base_url))
    }

    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.endpoint = endpoint_for(base_url);
        self
    }

    pub fn with_defaults(mut self, defaults: RequestDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// True when an API key is stored
    pub async fn is_configured(&self) -> ChatResult<bool> {
        Ok(Settings::new(self.config.as_ref()).is_api_key_set().await?)
    }

    /// Non-streaming convenience call; `None` means cancelled
    pub async fn chat(
        &self,
        message: &str,
        system: Option<&str>,
        options: ChatOptions,
    ) -> ChatResult<Option<ChatResponse>> {
        let request = ChatRequest::new(create_chat_messages(message, system));
        self.chat_with_params(request, options).await
    }

    /// Streaming convenience call
    pub async fn chat_stream<F>(
        &self,
        message: &str,
        on_chunk: F,
        system: Option<&str>,
        options: ChatOptions,
    ) -> ChatResult<StreamOutcome>
    where
        F: FnMut(&ChatStreamChunk) + Send,
    {
        let request = ChatRequest::new(create_chat_messages(message, system));
        self.chat_stream_with_params(request, on_chunk, options)
            .await
    }

    /// Single-message call using [`RequestDefaults::simple`]
    pub async fn send_message(
        &self,
        message: &str,
        options: ChatOptions,
    ) -> ChatResult<Option<ChatResponse>> {
        let request = ChatRequest::new(vec![Message::user(message)]);
        self.execute(request, &RequestDefaults::simple(), options)
            .await
    }

    /// Streaming single-message call using [`RequestDefaults::simple`]
    pub async fn send_streaming_message<F>(
        &self,
        message: &str,
        on_chunk: F,
        options: ChatOptions,
    ) -> ChatResult<StreamOutcome>
    where
        F: FnMut(&ChatStreamChunk) + Send,
    {
        let request = ChatRequest::new(vec![Message::user(message)]);
        self.execute_stream(request, &RequestDefaults::simple(), on_chunk, options)
            .await
    }

    /// Non-streaming call with full control over the request
    pub async fn chat_with_params(
        &self,
        request: ChatRequest,
        options: ChatOptions,
    ) -> ChatResult<Option<ChatResponse>> {
        self.execute(request, &self.defaults, options).await
    }

    /// Streaming call with full control over the request.
    ///
    /// `on_chunk` runs for every chunk, in arrival order, before the next
    /// chunk is read. Errors are returned, never passed to `on_chunk`.
    pub async fn chat_stream_with_params<F>(
        &self,
        request: ChatRequest,
        on_chunk: F,
        options: ChatOptions,
    ) -> ChatResult<StreamOutcome>
    where
        F: FnMut(&ChatStreamChunk) + Send,
    {
        self.execute_stream(request, &self.defaults, on_chunk, options)
            .await
    }

    async fn execute(
        &self,
        request: ChatRequest,
        defaults: &RequestDefaults,
        options: ChatOptions,
    ) -> ChatResult<Option<ChatResponse>> {
        let cancel = options.cancel.clone().unwrap_or_default();
        let request = self.prepare(request, defaults, &options, false).await?;
        let request_id = request.request_id;

        if cancel.is_cancelled() {
            info!("Chat cancelled before sending [request_id: {}]", request_id);
            return Ok(None);
        }

        let Some(mut bytes) = self.transport.open(request, &cancel).await? else {
            return Ok(None);
        };

        let mut body = Vec::new();
        loop {
            if cancel.is_cancelled() {
                info!("Chat cancelled while reading body [request_id: {}]", request_id);
                return Ok(None);
            }
            match bytes.next().await {
                Some(Ok(part)) => body.extend_from_slice(&part),
                Some(Err(_)) if cancel.is_cancelled() => return Ok(None),
                Some(Err(e)) => return Err(e),
                None => break,
            }
        }

        let response: ChatResponse = serde_json::from_slice(&body)?;
        info!("Chat completed [request_id: {}]", request_id);

        if options.enable_tools {
            let calls: Vec<PendingToolCall> = response
                .choices
                .iter()
                .flat_map(|c| c.message.tool_calls.iter().flatten())
                .map(|call| PendingToolCall {
                    id: call.id.clone(),
                    name: call.function.name.clone(),
                    arguments: call.function.arguments.clone(),
                })
                .collect();
            if !calls.is_empty() {
                self.spawn_tool_calls(calls, request_id);
            }
        }

        Ok(Some(response))
    }

    async fn execute_stream<F>(
        &self,
        request: ChatRequest,
        defaults: &RequestDefaults,
        mut on_chunk: F,
        options: ChatOptions,
    ) -> ChatResult<StreamOutcome>
    where
        F: FnMut(&ChatStreamChunk) + Send,
    {
        let cancel = options.cancel.clone().unwrap_or_default();
        let request = self.prepare(request, defaults, &options, true).await?;
        let request_id = request.request_id;

        if cancel.is_cancelled() {
            info!("Stream cancelled before sending [request_id: {}]", request_id);
            return Ok(StreamOutcome::Cancelled);
        }

        let Some(bytes) = self.transport.open(request, &cancel).await? else {
            return Ok(StreamOutcome::Cancelled);
        };

        let mut chunks = ChunkStream::new(bytes, cancel);
        let mut tool_calls = ToolCallAccumulator::new();
        let mut delivered = 0usize;

        while let Some(chunk) = chunks.next_chunk().await {
            let chunk = chunk?;
            on_chunk(&chunk);
            delivered += 1;

            if options.enable_tools {
                let completed = tool_calls.ingest(&chunk);
                if !completed.is_empty() {
                    self.spawn_tool_calls(completed, request_id);
                }
            }
        }

        if chunks.was_cancelled() {
            let dropped = tool_calls.discard();
            info!(
                "Stream cancelled after {} chunks, {} open tool calls dropped [request_id: {}]",
                delivered, dropped, request_id
            );
            return Ok(StreamOutcome::Cancelled);
        }

        let remaining = tool_calls.finish();
        if !remaining.is_empty() {
            self.spawn_tool_calls(remaining, request_id);
        }

        info!(
            "Stream completed with {} chunks ({} malformed lines skipped) [request_id: {}]",
            delivered,
            chunks.malformed_lines(),
            request_id
        );
        Ok(StreamOutcome::Completed)
    }

    /// Route completed tool calls on a detached task so handlers never hold up the stream
    fn spawn_tool_calls(&self, calls: Vec<PendingToolCall>, request_id: Uuid) {
        debug!(
            "Dispatching {} tool calls [request_id: {}]",
            calls.len(),
            request_id
        );
        let tools = Arc::clone(&self.tools);
        tokio::spawn(async move {
            tools.dispatch_all(calls).await;
        });
    }

    /// Resolve credential, model, tools and defaults into a validated request
    async fn prepare(
        &self,
        mut request: ChatRequest,
        defaults: &RequestDefaults,
        options: &ChatOptions,
        streaming: bool,
    ) -> ChatResult<TransportRequest> {
        let settings = Settings::new(self.config.as_ref());
        let api_key = settings.api_key().await?;

        if request.model.as_deref().is_none_or(|m| m.trim().is_empty()) {
            request.model = settings.model().await?;
        }

        if options.enable_tools && !self.tools.is_empty() {
            request.tools = Some(self.tools.definitions());
            request.tool_choice = Some(ToolChoice::Auto);
        }

        let request = defaults.apply(request, streaming);
        debug!(
            "Prepared request for model {:?} with {} messages",
            request.model,
            request.messages.len()
        );

        let request = TransportRequest::new(&self.endpoint, api_key, request);
        request.validate()?;
        Ok(request)
    }
}

fn endpoint_for(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.endpoint)
            .field("tools", &self.tools)
            .field("defaults", &self.defaults)
            .finish()
    }
}
