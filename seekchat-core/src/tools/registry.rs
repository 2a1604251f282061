//! Tool registry and call router
//!
//! The registry is built once at startup and shared read-only across calls.
//! Dispatch failures are reported to the caller of [`ToolRegistry::dispatch`]
//! but [`ToolRegistry::dispatch_all`] only logs them, so a failing tool
//! never aborts the chat stream that requested it.

use super::accumulator::PendingToolCall;
use crate::error::{ChatError, ChatResult};
use crate::protocol::ToolDefinition;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A capability the model may invoke
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Definition advertised to the model; its name is the registry key
    fn definition(&self) -> ToolDefinition;

    /// Run the capability with parsed arguments
    async fn invoke(&self, args: Value) -> anyhow::Result<Value>;
}

/// Result of one routed call
#[derive(Debug)]
pub struct ToolCallOutcome {
    pub id: String,
    pub name: String,
    pub result: ChatResult<Value>,
}

/// Registry of tool handlers keyed by function name
#[derive(Default)]
pub struct ToolRegistry {
    handlers: Vec<Arc<dyn ToolHandler>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; a handler with the same name is replaced
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) -> &mut Self {
        let name = handler.definition().name().to_string();
        match self.by_name.get(&name) {
            Some(&slot) => {
                debug!("Replacing tool handler '{}'", name);
                self.handlers[slot] = handler;
            }
            None => {
                self.by_name.insert(name, self.handlers.len());
                self.handlers.push(handler);
            }
        }
        self
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.register(handler);
        self
    }

    /// Definitions of every registered tool, in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.handlers.iter().map(|h| h.definition()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Invoke `name` with its complete JSON argument string.
    ///
    /// An empty argument string is treated as `{}`.
    pub async fn dispatch(&self, name: &str, arguments: &str) -> ChatResult<Value> {
        let handler = self
            .by_name
            .get(name)
            .map(|&slot| self.handlers[slot].clone())
            .ok_or_else(|| ChatError::UnknownTool(name.to_string()))?;

        let args: Value = if arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(arguments).map_err(|e| ChatError::ToolArguments {
                name: name.to_string(),
                message: e.to_string(),
            })?
        };

        handler
            .invoke(args)
            .await
            .map_err(|e| ChatError::ToolFailed {
                name: name.to_string(),
                message: format!("{:#}", e),
            })
    }

    /// Dispatch every call in order, logging failures instead of returning them early
    pub async fn dispatch_all(&self, calls: Vec<PendingToolCall>) -> Vec<ToolCallOutcome> {
        let mut outcomes = Vec::with_capacity(calls.len());
        for call in calls {
            let result = self.dispatch(&call.name, &call.arguments).await;
            match &result {
                Ok(value) => info!("Tool '{}' ({}) returned {}", call.name, call.id, value),
                Err(e) => warn!("Tool '{}' ({}) failed: {}", call.name, call.id, e),
            }
            outcomes.push(ToolCallOutcome {
                id: call.id,
                name: call.name,
                result,
            });
        }
        outcomes
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.by_name.keys().collect();
        names.sort();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}
