//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use seekchat_core::cancel::CancellationToken;
use seekchat_core::error::{ChatError, ChatResult};
use seekchat_core::http::{ByteStream, Transport, TransportRequest};
use seekchat_core::protocol::{ChatRequest, ToolDefinition};
use seekchat_core::tools::ToolHandler;
use serde_json::{json, Value};
use std::sync::{Mutex, Once};
use std::time::Duration;

static TRACING: Once = Once::new();

/// Install a test subscriber honoring `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// One `data:` line per payload
pub fn sse_body(payloads: &[&str]) -> String {
    payloads
        .iter()
        .map(|p| format!("data: {}\n\n", p))
        .collect()
}

/// Payload of a chunk carrying one text delta
pub fn content_delta(text: &str) -> String {
    json!({"choices": [{"index": 0, "delta": {"content": text}}]}).to_string()
}

/// Transport double that records every request and replays a canned body
pub struct SpyTransport {
    parts: Vec<Result<String, String>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl SpyTransport {
    /// Reply with `parts`, one read per element
    pub fn new(parts: Vec<String>) -> Self {
        Self {
            parts: parts.into_iter().map(Ok).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply with one `data:` line per payload followed by the sentinel
    pub fn sse(payloads: &[&str]) -> Self {
        let mut body = sse_body(payloads);
        body.push_str("data: [DONE]\n\n");
        Self::new(vec![body])
    }

    /// Stream one text delta per element
    pub fn text_stream(texts: &[&str]) -> Self {
        let payloads: Vec<String> = texts.iter().map(|t| content_delta(t)).collect();
        let payloads: Vec<&str> = payloads.iter().map(String::as_str).collect();
        Self::sse(&payloads)
    }

    /// Reply with `parts`, then fail the next read
    pub fn failing_after(parts: Vec<String>, message: &str) -> Self {
        let mut spy = Self::new(parts);
        spy.parts.push(Err(message.to_string()));
        spy
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<TransportRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn last_body(&self) -> Option<ChatRequest> {
        self.last_request().map(|r| r.body)
    }
}

#[async_trait]
impl Transport for SpyTransport {
    async fn open(
        &self,
        request: TransportRequest,
        cancel: &CancellationToken,
    ) -> ChatResult<Option<ByteStream>> {
        self.requests.lock().unwrap().push(request);
        if cancel.is_cancelled() {
            return Ok(None);
        }

        let parts: Vec<ChatResult<Bytes>> = self
            .parts
            .iter()
            .map(|p| match p {
                Ok(text) => Ok(Bytes::from(text.clone())),
                Err(message) => Err(ChatError::Transport(message.clone())),
            })
            .collect();
        Ok(Some(Box::pin(futures::stream::iter(parts))))
    }
}

/// Tool handler that records the arguments of every invocation
pub struct RecordingTool {
    name: String,
    stall: bool,
    pub calls: Mutex<Vec<Value>>,
}

impl RecordingTool {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stall: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Records its arguments, then never returns
    pub fn stalled(name: &str) -> Self {
        Self {
            stall: true,
            ..Self::new(name)
        }
    }

    pub fn invocations(&self) -> Vec<Value> {
        self.calls.lock().unwrap().clone()
    }

    /// Wait for `count` invocations from detached dispatch tasks
    pub async fn wait_for(&self, count: usize) -> Vec<Value> {
        let waited = tokio::time::timeout(Duration::from_secs(2), async {
            while self.calls.lock().unwrap().len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "tool '{}' was not invoked {} times", self.name, count);
        self.invocations()
    }
}

#[async_trait]
impl ToolHandler for RecordingTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            &self.name,
            "Records its arguments",
            json!({"type": "object", "properties": {}}),
        )
    }

    async fn invoke(&self, args: Value) -> anyhow::Result<Value> {
        self.calls.lock().unwrap().push(args);
        if self.stall {
            futures::future::pending::<()>().await;
        }
        Ok(json!(true))
    }
}
