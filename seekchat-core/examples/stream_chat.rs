//! Stream Chat Demo
//!
//! Interactive terminal chat against the DeepSeek API:
//! - answers are printed as they stream in
//! - Ctrl-C cancels the current answer without ending the session
//! - the model may call `openWindow`, which is printed instead of opening a browser
//!
//! Run with: DEEPSEEK_API_KEY=sk-... cargo run --example stream_chat [config.yaml]

use async_trait::async_trait;
use seekchat_core::config::{load_from_yaml, ClientConfig, MemoryConfigStore};
use seekchat_core::tools::{OpenRequest, OpenTarget, OpenUrlTool, ToolRegistry, UrlOpener};
use seekchat_core::{
    CancellationToken, ChatClient, ChatOptions, ChatRequest, Conversation, ResponseAccumulator,
    StreamOutcome,
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

struct PrintOpener;

#[async_trait]
impl UrlOpener for PrintOpener {
    async fn open(&self, request: &OpenRequest) -> anyhow::Result<()> {
        match request.target {
            OpenTarget::Tab => println!("\n🔗 [open in new tab] {}", request.url),
            OpenTarget::Window { width, height } => {
                println!("\n🪟 [open {}x{} window] {}", width, height, request.url)
            }
        }
        Ok(())
    }
}

fn prompt() -> io::Result<Option<String>> {
    print!("\n> ");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => load_from_yaml(path)?,
        None => ClientConfig::default(),
    };

    let store = Arc::new(MemoryConfigStore::new());
    config.seed_store(store.as_ref()).await?;
    if let Ok(key) = std::env::var("DEEPSEEK_API_KEY") {
        seekchat_core::Settings::new(store.as_ref())
            .set_api_key(&key.into())
            .await?;
    }

    let tools = ToolRegistry::new().with(Arc::new(OpenUrlTool::new(Arc::new(PrintOpener))));
    let client = ChatClient::from_config(&config, store)?.with_tools(Arc::new(tools));

    if !client.is_configured().await? {
        eprintln!("No API key: set DEEPSEEK_API_KEY or api_key in the config file");
        return Ok(());
    }

    println!("🚀 Seekchat {} ({})", seekchat_core::version(), client.endpoint());
    println!("Type a message, Ctrl-C stops an answer, Ctrl-D exits.");

    let mut conversation = Conversation::new().with_system_prompt(
        "You are a helpful assistant. When the user asks to open a page, use the openWindow tool.",
    );

    while let Some(message) = prompt()? {
        if message.is_empty() {
            continue;
        }

        let token = CancellationToken::new();
        let trigger = token.clone();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                trigger.cancel();
            }
        });

        let mut answer = ResponseAccumulator::new();
        let result = client
            .chat_stream_with_params(
                ChatRequest::new(conversation.prepare_messages(&message)),
                |chunk| {
                    print!("{}", chunk.content());
                    let _ = io::stdout().flush();
                    answer.push(chunk);
                },
                ChatOptions::default().with_cancel(token),
            )
            .await;
        ctrl_c.abort();

        match result {
            Ok(StreamOutcome::Completed) => println!(),
            Ok(StreamOutcome::Cancelled) => println!("\n⏹ cancelled"),
            Err(e) if e.requires_configuration() => {
                eprintln!("\n⚠️ {} (check your settings)", e);
                continue;
            }
            Err(e) => {
                eprintln!("\n❌ {}", e);
                continue;
            }
        }

        conversation.record_exchange(&message, answer.content());
    }

    Ok(())
}
