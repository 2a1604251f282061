//! Conversation history and streamed-response accumulation

use crate::protocol::{ChatStreamChunk, Message};

/// Messages from history sent along with each new turn
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// A chat session: optional system prompt plus prior turns
#[derive(Debug, Clone)]
pub struct Conversation {
    system_prompt: Option<String>,
    history: Vec<Message>,
    window: usize,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            system_prompt: None,
            history: Vec::new(),
            window: DEFAULT_HISTORY_WINDOW,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Number of most recent history messages included per request
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Messages for the next request: system prompt, recent history, then `user_text`
    pub fn prepare_messages(&self, user_text: &str) -> Vec<Message> {
        let start = self.history.len().saturating_sub(self.window);
        let recent = &self.history[start..];

        let mut messages = Vec::with_capacity(recent.len() + 2);
        if let Some(prompt) = &self.system_prompt {
            messages.push(Message::system(prompt.as_str()));
        }
        messages.extend_from_slice(recent);
        messages.push(Message::user(user_text));
        messages
    }

    /// Append a finished turn. Turns with no assistant text are not kept.
    ///
    /// Only the most recent `window` messages are retained.
    pub fn record_exchange(&mut self, user_text: &str, assistant_text: &str) -> bool {
        if assistant_text.is_empty() {
            return false;
        }
        self.history.push(Message::user(user_text));
        self.history.push(Message::assistant(assistant_text));
        let excess = self.history.len().saturating_sub(self.window);
        self.history.drain(..excess);
        true
    }
}

/// Collects the text of a streamed answer
#[derive(Debug, Clone, Default)]
pub struct ResponseAccumulator {
    content: String,
    reasoning: String,
    chunks: usize,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &ChatStreamChunk) {
        self.chunks += 1;
        for choice in &chunk.choices {
            if let Some(text) = &choice.delta.content {
                self.content.push_str(text);
            }
            if let Some(text) = &choice.delta.reasoning_content {
                self.reasoning.push_str(text);
            }
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Chain-of-thought text from reasoning models
    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    pub fn into_content(self) -> String {
        self.content
    }
}
