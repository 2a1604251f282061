//! Protocol module for chat-completions request/response structures
//!
//! These structures mirror the OpenAI-compatible wire format spoken by the
//! DeepSeek chat-completions endpoint.

pub mod types;

pub use types::{
    ChatRequest, ChatResponse, ChatStreamChunk, CompletionUsage, FunctionCall, FunctionCallDelta,
    FunctionDefinition, Message, MessageDelta, MessageRole, ResponseChoice, ResponseFormat, Stop,
    StreamChoice, StreamOptions, ToolCall, ToolCallDelta, ToolChoice, ToolDefinition,
};
