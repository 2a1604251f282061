//! Built-in `openWindow` capability

use super::registry::ToolHandler;
use crate::protocol::ToolDefinition;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// Function name advertised to the model
pub const OPEN_URL_TOOL: &str = "openWindow";

/// Where a URL should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenTarget {
    Tab,
    Window { width: u32, height: u32 },
}

/// A validated request to show a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub url: Url,
    pub target: OpenTarget,
}

/// Host integration that actually opens the URL (browser tab, window, log)
#[async_trait]
pub trait UrlOpener: Send + Sync {
    async fn open(&self, request: &OpenRequest) -> anyhow::Result<()>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenUrlArgs {
    #[serde(default)]
    url: Option<String>,
    #[serde(default = "default_new_tab")]
    new_tab: bool,
    #[serde(default = "default_width")]
    width: u32,
    #[serde(default = "default_height")]
    height: u32,
}

fn default_new_tab() -> bool {
    true
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

/// Prepend `https://` to scheme-less input and parse it
pub fn normalize_url(raw: &str) -> Result<Url, url::ParseError> {
    let raw = raw.trim();
    if raw.starts_with("http://") || raw.starts_with("https://") {
        Url::parse(raw)
    } else {
        Url::parse(&format!("https://{}", raw))
    }
}

/// Opens a URL in a new tab or a sized window.
///
/// Yields `true` when the opener succeeded and `false` otherwise; a bad
/// URL is a tool-level `false`, not a dispatch error.
pub struct OpenUrlTool {
    opener: Arc<dyn UrlOpener>,
}

impl OpenUrlTool {
    pub fn new(opener: Arc<dyn UrlOpener>) -> Self {
        Self { opener }
    }
}

#[async_trait]
impl ToolHandler for OpenUrlTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            OPEN_URL_TOOL,
            "Open a URL in a new browser tab or in a new window",
            json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "URL to open; https:// is added when no http:// or https:// prefix is given"
                    },
                    "newTab": {
                        "type": "boolean",
                        "description": "Open in a new tab (default true); false opens a new window"
                    },
                    "width": {
                        "type": "number",
                        "description": "Window width, only used when newTab is false"
                    },
                    "height": {
                        "type": "number",
                        "description": "Window height, only used when newTab is false"
                    }
                },
                "required": ["url"]
            }),
        )
    }

    async fn invoke(&self, args: Value) -> anyhow::Result<Value> {
        let args: OpenUrlArgs = serde_json::from_value(args)?;

        let raw = match args.url.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                warn!("{} called without a URL", OPEN_URL_TOOL);
                return Ok(Value::Bool(false));
            }
        };

        let url = match normalize_url(raw) {
            Ok(url) => url,
            Err(e) => {
                warn!("{} rejected URL {:?}: {}", OPEN_URL_TOOL, raw, e);
                return Ok(Value::Bool(false));
            }
        };

        let target = if args.new_tab {
            OpenTarget::Tab
        } else {
            OpenTarget::Window {
                width: args.width,
                height: args.height,
            }
        };
        let request = OpenRequest { url, target };

        match self.opener.open(&request).await {
            Ok(()) => {
                info!("Opened {} ({:?})", request.url, request.target);
                Ok(Value::Bool(true))
            }
            Err(e) => {
                warn!("Failed to open {}: {:#}", request.url, e);
                Ok(Value::Bool(false))
            }
        }
    }
}
