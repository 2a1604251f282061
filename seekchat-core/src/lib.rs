//! Seekchat Core Library
//!
//! Streaming client for the DeepSeek chat-completions API: request
//! defaults and validation, server-sent-event decoding, cooperative
//! cancellation and routing of model-initiated tool calls.
//!
//! ```no_run
//! use seekchat_core::{ChatClient, ChatOptions, HttpClient, MemoryConfigStore, StreamOutcome};
//! use std::sync::Arc;
//!
//! # async fn run() -> seekchat_core::ChatResult<()> {
//! let client = ChatClient::new(
//!     Arc::new(HttpClient::new()?),
//!     Arc::new(MemoryConfigStore::with_api_key("sk-...")),
//! );
//! let outcome = client
//!     .chat_stream("Hello", |chunk| print!("{}", chunk.content()), None, ChatOptions::default())
//!     .await?;
//! assert_eq!(outcome, StreamOutcome::Completed);
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod http;
pub mod protocol;
pub mod stream;
pub mod tools;

pub use cancel::CancellationToken;
pub use client::{create_chat_messages, ChatClient, ChatOptions, RequestDefaults, StreamOutcome};
pub use config::{ClientConfig, ConfigStore, MemoryConfigStore, SecretString, Settings};
pub use conversation::{Conversation, ResponseAccumulator};
pub use error::{ChatError, ChatResult, ValidationError};
pub use http::{HttpClient, Transport, TransportRequest};
pub use protocol::{ChatRequest, ChatResponse, ChatStreamChunk, Message, MessageRole};
pub use tools::{OpenUrlTool, ToolHandler, ToolRegistry, UrlOpener};

/// Returns the version of the Seekchat Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
