//! Prompt-config driven Ollama clients
//!
//! A [`PromptConfig`] names a modality (chat, completion or embeddings), a model
//! and its sampling parameters. [`load_client`] turns it into a [`ClientHandle`]
//! pointed at the Ollama endpoint from [`OllamaSettings`].
mod client;
mod config;
mod factory;
mod message;
mod sink;

use thiserror::Error;

/// Result type for prompt-llm operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for prompt-llm operations
#[derive(Debug, Error)]
pub enum Error {
    /// Prompt config names a model type with no client
    #[error("LLM type {0} not supported")]
    NotSupported(String),

    /// API error
    #[error("API error: {0}")]
    Api(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML deserialization error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error (config files, output sinks)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

pub use client::{
    ChatClient, Client, ClientHandle, CompletionClient, EmbeddingsClient, EventStream,
    StreamEvent, DEFAULT_OLLAMA_ENDPOINT,
};
pub use config::{
    ModelType, OllamaSettings, PromptConfig, PromptParameters, RawPromptConfig,
    OLLAMA_ENDPOINT_VAR,
};
pub use factory::{load_client, load_client_from_raw, load_client_with_sink};
pub use message::{Message, MessageRole, Usage};
pub use sink::{CaptureSink, StdoutSink, TokenSink};
