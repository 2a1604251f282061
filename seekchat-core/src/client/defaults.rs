//! Default request parameters

use crate::config::DEFAULT_MODEL;
use crate::protocol::{ChatRequest, ResponseFormat, ToolChoice};

/// Values filled into a [`ChatRequest`] wherever the caller left a field unset.
///
/// Caller-supplied values always win, except `stream`, which the streaming
/// entry points force to `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDefaults {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
    pub response_format: Option<ResponseFormat>,
    pub logprobs: Option<bool>,
    /// Tool choice for requests without tools; requests with tools get `auto`
    pub tool_choice: Option<ToolChoice>,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            top_p: Some(1.0),
            frequency_penalty: Some(0.0),
            presence_penalty: Some(0.0),
            response_format: Some(ResponseFormat::Text),
            logprobs: Some(false),
            tool_choice: Some(ToolChoice::None),
        }
    }
}

impl RequestDefaults {
    /// Smaller table used by the single-message entry points
    pub fn simple() -> Self {
        Self {
            max_tokens: 1000,
            top_p: None,
            frequency_penalty: None,
            presence_penalty: None,
            response_format: None,
            logprobs: None,
            tool_choice: None,
            ..Self::default()
        }
    }

    /// Fill unset fields of `request`
    pub fn apply(&self, mut request: ChatRequest, streaming: bool) -> ChatRequest {
        if request.model.as_deref().is_none_or(|m| m.trim().is_empty()) {
            request.model = Some(self.model.clone());
        }
        request.temperature.get_or_insert(self.temperature);
        request.max_tokens.get_or_insert(self.max_tokens);
        request.top_p = request.top_p.or(self.top_p);
        request.frequency_penalty = request.frequency_penalty.or(self.frequency_penalty);
        request.presence_penalty = request.presence_penalty.or(self.presence_penalty);
        if request.response_format.is_none() {
            request.response_format = self.response_format.clone();
        }
        request.logprobs = request.logprobs.or(self.logprobs);

        if request.tool_choice.is_none() {
            let has_tools = request.tools.as_ref().is_some_and(|t| !t.is_empty());
            request.tool_choice = if has_tools {
                Some(ToolChoice::Auto)
            } else {
                self.tool_choice
            };
        }

        if streaming {
            request.stream = Some(true);
        } else {
            request.stream.get_or_insert(false);
        }

        request
    }
}
