//! Show command implementation

use anyhow::{Context, Result};
use prompt_llm::{load_client, OllamaSettings, PromptConfig};
use std::path::Path;

/// Run the show command
pub fn run(config_path: &Path) -> Result<()> {
    let config = PromptConfig::from_file(config_path)
        .with_context(|| format!("Failed to load prompt config {}", config_path.display()))?;
    let handle = load_client(&config, &OllamaSettings::from_env())?;

    println!("Type: {}", handle.model_type());
    println!("Model: {}", handle.model());
    match handle.endpoint() {
        Some(endpoint) => println!("Endpoint: {}", endpoint),
        None => println!("Endpoint: (unset, using {})", handle.base_url()),
    }
    if let Some(temperature) = handle.temperature() {
        println!("Temperature: {}", temperature);
    }
    println!("Streaming: {}", handle.is_streaming());

    Ok(())
}
