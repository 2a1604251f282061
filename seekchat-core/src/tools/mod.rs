//! Tool-call routing
//!
//! Streamed tool-call fragments are reassembled by [`ToolCallAccumulator`]
//! and handed to the handler registered under the call's function name.

pub mod accumulator;
pub mod open_url;
pub mod registry;

pub use accumulator::{PendingToolCall, ToolCallAccumulator};
pub use open_url::{normalize_url, OpenRequest, OpenTarget, OpenUrlTool, UrlOpener, OPEN_URL_TOOL};
pub use registry::{ToolCallOutcome, ToolHandler, ToolRegistry};
