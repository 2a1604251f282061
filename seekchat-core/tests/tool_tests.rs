//! Tool routing tests

mod common;

use async_trait::async_trait;
use common::RecordingTool;
use seekchat_core::error::ChatError;
use seekchat_core::protocol::ChatStreamChunk;
use seekchat_core::tools::{
    OpenRequest, OpenTarget, OpenUrlTool, PendingToolCall, ToolCallAccumulator, ToolRegistry,
    UrlOpener, OPEN_URL_TOOL,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct BrowserSpy {
    opened: Mutex<Vec<OpenRequest>>,
}

#[async_trait]
impl UrlOpener for BrowserSpy {
    async fn open(&self, request: &OpenRequest) -> anyhow::Result<()> {
        self.opened.lock().unwrap().push(request.clone());
        Ok(())
    }
}

fn chunk(value: Value) -> ChatStreamChunk {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn test_open_url_through_registry() {
    let browser = Arc::new(BrowserSpy::default());
    let registry = ToolRegistry::new().with(Arc::new(OpenUrlTool::new(browser.clone())));

    let result = registry
        .dispatch(
            OPEN_URL_TOOL,
            r#"{"url": "docs.rs", "newTab": false, "width": 1024}"#,
        )
        .await
        .unwrap();

    assert_eq!(result, json!(true));
    let opened = browser.opened.lock().unwrap();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].url.as_str(), "https://docs.rs/");
    assert_eq!(
        opened[0].target,
        OpenTarget::Window {
            width: 1024,
            height: 600
        }
    );
}

#[tokio::test]
async fn test_open_url_rejects_wrong_argument_types() {
    let registry =
        ToolRegistry::new().with(Arc::new(OpenUrlTool::new(Arc::new(BrowserSpy::default()))));

    let err = registry
        .dispatch(OPEN_URL_TOOL, r#"{"url": "docs.rs", "width": "wide"}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::ToolFailed { ref name, .. } if name == OPEN_URL_TOOL));
}

#[tokio::test]
async fn test_definitions_are_advertised_in_order() {
    let registry = ToolRegistry::new()
        .with(Arc::new(OpenUrlTool::new(Arc::new(BrowserSpy::default()))))
        .with(Arc::new(RecordingTool::new("record")));

    let names: Vec<String> = registry
        .definitions()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    assert_eq!(names, vec![OPEN_URL_TOOL, "record"]);

    let wire = serde_json::to_value(&registry.definitions()[0]).unwrap();
    assert_eq!(wire["type"], "function");
    assert_eq!(wire["function"]["parameters"]["required"], json!(["url"]));
}

#[tokio::test]
async fn test_accumulated_fragments_dispatch_once() {
    let tool = Arc::new(RecordingTool::new("record"));
    let registry = ToolRegistry::new().with(tool.clone());
    let mut acc = ToolCallAccumulator::new();

    let fragments = ["{\"a\"", ": [1, ", "2]}"];
    for (i, fragment) in fragments.iter().enumerate() {
        let mut call = json!({"index": 0, "function": {"arguments": fragment}});
        if i == 0 {
            call["id"] = json!("call_1");
            call["function"]["name"] = json!("record");
        }
        let completed = acc.ingest(&chunk(json!({"choices": [{"delta": {"tool_calls": [call]}}]})));
        assert!(completed.is_empty());
    }

    let completed = acc.finish();
    assert_eq!(
        completed,
        vec![PendingToolCall {
            id: "call_1".to_string(),
            name: "record".to_string(),
            arguments: "{\"a\": [1, 2]}".to_string(),
        }]
    );

    let outcomes = registry.dispatch_all(completed).await;
    assert!(outcomes[0].result.is_ok());
    assert_eq!(tool.invocations(), vec![json!({"a": [1, 2]})]);
}

#[tokio::test]
async fn test_dispatch_all_reports_every_outcome() {
    let registry = ToolRegistry::new().with(Arc::new(RecordingTool::new("record")));
    let calls = vec![
        PendingToolCall {
            id: "1".to_string(),
            name: "nope".to_string(),
            arguments: String::new(),
        },
        PendingToolCall {
            id: "2".to_string(),
            name: "record".to_string(),
            arguments: "not json".to_string(),
        },
        PendingToolCall {
            id: "3".to_string(),
            name: "record".to_string(),
            arguments: String::new(),
        },
    ];

    let outcomes = registry.dispatch_all(calls).await;
    assert!(matches!(outcomes[0].result, Err(ChatError::UnknownTool(_))));
    assert!(matches!(outcomes[1].result, Err(ChatError::ToolArguments { .. })));
    assert_eq!(outcomes[2].result.as_ref().unwrap(), &json!(true));
}
