//! Reassembly of tool calls streamed as fragments

use crate::protocol::ChatStreamChunk;
use std::collections::BTreeMap;
use tracing::warn;

/// A fully reassembled tool call ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToolCall {
    pub id: String,
    pub name: String,
    /// Concatenated JSON argument text
    pub arguments: String,
}

#[derive(Debug, Default)]
struct PartialCall {
    id: String,
    name: String,
    arguments: String,
}

/// Collects [`ToolCallDelta`](crate::protocol::ToolCallDelta) fragments
/// keyed by choice and call index.
///
/// The id and name arrive once, usually in the first fragment; argument
/// text is appended in arrival order. A choice's calls are complete when
/// that choice reports a `finish_reason`, or when the stream ends.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<(usize, usize), PartialCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one chunk; returns the calls it completed
    pub fn ingest(&mut self, chunk: &ChatStreamChunk) -> Vec<PendingToolCall> {
        let mut completed = Vec::new();

        for choice in &chunk.choices {
            if let Some(deltas) = &choice.delta.tool_calls {
                for delta in deltas {
                    let call = self.calls.entry((choice.index, delta.index)).or_default();
                    if let Some(id) = &delta.id {
                        if call.id.is_empty() {
                            call.id = id.clone();
                        }
                    }
                    if let Some(function) = &delta.function {
                        if let Some(name) = &function.name {
                            if call.name.is_empty() {
                                call.name = name.clone();
                            }
                        }
                        if let Some(arguments) = &function.arguments {
                            call.arguments.push_str(arguments);
                        }
                    }
                }
            }

            if choice.finish_reason.is_some() {
                completed.extend(self.drain_choice(choice.index));
            }
        }

        completed
    }

    /// Stream ended: every call still open is complete
    pub fn finish(&mut self) -> Vec<PendingToolCall> {
        let calls = std::mem::take(&mut self.calls);
        calls.into_values().filter_map(Self::complete).collect()
    }

    /// Drop open calls without dispatching them
    pub fn discard(&mut self) -> usize {
        let dropped = self.calls.len();
        self.calls.clear();
        dropped
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    fn drain_choice(&mut self, choice_index: usize) -> Vec<PendingToolCall> {
        let keys: Vec<_> = self
            .calls
            .range((choice_index, 0)..=(choice_index, usize::MAX))
            .map(|(k, _)| *k)
            .collect();
        keys.into_iter()
            .filter_map(|k| self.calls.remove(&k))
            .filter_map(Self::complete)
            .collect()
    }

    fn complete(call: PartialCall) -> Option<PendingToolCall> {
        if call.name.is_empty() {
            warn!("Dropping tool call {:?} without a function name", call.id);
            return None;
        }
        Some(PendingToolCall {
            id: call.id,
            name: call.name,
            arguments: call.arguments,
        })
    }
}
