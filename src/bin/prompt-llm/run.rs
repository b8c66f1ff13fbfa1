//! Run command implementation

use anyhow::{Context, Result};
use prompt_llm::{load_client, ClientHandle, Message, OllamaSettings, PromptConfig, Usage};
use std::io::{self, Read};
use std::path::Path;
use tracing::info;

/// Number of leading embedding values printed
const EMBEDDING_PREVIEW: usize = 8;

/// Run the run command
pub async fn run(
    config_path: &Path,
    system: Option<String>,
    token_stats: bool,
    query: Vec<String>,
) -> Result<()> {
    let config = PromptConfig::from_file(config_path)
        .with_context(|| format!("Failed to load prompt config {}", config_path.display()))?;
    let settings = OllamaSettings::from_env();
    let handle = load_client(&config, &settings)?;

    info!(
        "Using {} model {} at {}",
        handle.model_type(),
        handle.model(),
        handle.base_url()
    );

    let query_text = if query.is_empty() {
        let mut buffer = String::new();
        io::stdin().lock().read_to_string(&mut buffer)?;
        buffer.trim().to_string()
    } else {
        query.join(" ")
    };

    match handle {
        ClientHandle::Chat(chat) => {
            let mut messages = Vec::new();
            if let Some(system) = system {
                messages.push(Message::system(system));
            }
            messages.push(Message::user(query_text));

            let (_, usage) = chat.invoke(&messages).await?;
            if token_stats {
                print_usage(&usage);
            }
        }
        ClientHandle::Completion(completion) => {
            let (_, usage) = completion.invoke(&query_text).await?;
            if token_stats {
                print_usage(&usage);
            }
        }
        ClientHandle::Embeddings(embeddings) => {
            let vector = embeddings.embed_query(&query_text).await?;
            let preview: Vec<String> = vector
                .iter()
                .take(EMBEDDING_PREVIEW)
                .map(|v| format!("{:.6}", v))
                .collect();
            println!("Dimensions: {}", vector.len());
            println!("[{}{}]", preview.join(", "), if vector.len() > EMBEDDING_PREVIEW { ", ..." } else { "" });
        }
    }

    Ok(())
}

fn print_usage(usage: &Usage) {
    println!();
    println!("=== Token Stats ===");
    println!("Prompt tokens: {}", usage.prompt_tokens);
    println!("Completion tokens: {}", usage.completion_tokens);
    println!("Total tokens: {}", usage.total_tokens);
}
