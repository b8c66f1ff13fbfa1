//! Prompt and endpoint configuration
//!
//! A prompt config selects the model type and sampling parameters:
//! ```yaml
//! type: chat          # or "completion", "embeddings"
//! model_name: llama2
//! parameters:
//!   temperature: 0.7
//! ```
//!
//! The serving endpoint is not part of the prompt config. It is read once from
//! the environment (`OLLAMA_ENDPOINT`, after loading an optional `.env` file)
//! into [`OllamaSettings`] and handed to the factory.

use super::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Environment variable holding the Ollama base URL
pub const OLLAMA_ENDPOINT_VAR: &str = "OLLAMA_ENDPOINT";

/// Model type (modality) served by a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    /// Multi-turn chat
    Chat,
    /// Single-shot text completion
    Completion,
    /// Text embeddings
    Embeddings,
}

impl ModelType {
    /// Get the config name for this model type
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Chat => "chat",
            ModelType::Completion => "completion",
            ModelType::Embeddings => "embeddings",
        }
    }

    /// Whether clients of this type generate text (and so take a temperature
    /// and stream their output)
    pub fn is_generative(&self) -> bool {
        match self {
            ModelType::Chat | ModelType::Completion => true,
            ModelType::Embeddings => false,
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chat" => Ok(ModelType::Chat),
            "completion" => Ok(ModelType::Completion),
            "embeddings" => Ok(ModelType::Embeddings),
            other => Err(Error::NotSupported(other.to_string())),
        }
    }
}

/// Sampling parameters of a prompt config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptParameters {
    /// Sampling temperature (chat and completion only). When absent the
    /// server's default applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Prompt config as written in a file, with the model type still untyped
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPromptConfig {
    /// Model type name
    #[serde(rename = "type")]
    pub model_type: String,

    /// Model identifier on the serving endpoint
    #[serde(default)]
    pub model_name: String,

    /// Sampling parameters
    #[serde(default)]
    pub parameters: PromptParameters,
}

/// Configuration for one LLM execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPromptConfig")]
pub struct PromptConfig {
    /// Model type
    #[serde(rename = "type")]
    pub model_type: ModelType,

    /// Model identifier on the serving endpoint
    pub model_name: String,

    /// Sampling parameters
    pub parameters: PromptParameters,
}

impl TryFrom<RawPromptConfig> for PromptConfig {
    type Error = Error;

    fn try_from(raw: RawPromptConfig) -> Result<Self> {
        Ok(PromptConfig {
            model_type: raw.model_type.parse()?,
            model_name: raw.model_name,
            parameters: raw.parameters,
        })
    }
}

impl PromptConfig {
    /// Create a config with default parameters
    pub fn new(model_type: ModelType, model_name: impl Into<String>) -> Self {
        PromptConfig {
            model_type,
            model_name: model_name.into(),
            parameters: PromptParameters::default(),
        }
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.parameters.temperature = Some(temperature);
        self
    }

    /// Parse a YAML prompt config
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let raw: RawPromptConfig = serde_yaml::from_str(s)?;
        raw.try_into()
    }

    /// Parse a TOML prompt config
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let raw: RawPromptConfig = toml::from_str(s)?;
        raw.try_into()
    }

    /// Parse a JSON prompt config
    pub fn from_json_str(s: &str) -> Result<Self> {
        let raw: RawPromptConfig = serde_json::from_str(s)?;
        raw.try_into()
    }

    /// Load a prompt config file, picking the format from its extension
    /// (`.yaml`/`.yml`, `.toml` or `.json`)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let parse: fn(&str) -> Result<Self> = match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml_str,
            Some("toml") => Self::from_toml_str,
            Some("json") => Self::from_json_str,
            _ => {
                return Err(Error::Config(format!(
                    "Unsupported prompt config format: {}",
                    path.display()
                )))
            }
        };

        let content = std::fs::read_to_string(path)?;
        parse(&content)
    }

    /// Get the sampling temperature, if set
    pub fn temperature(&self) -> Option<f64> {
        self.parameters.temperature
    }
}

/// Connection settings for the Ollama serving endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaSettings {
    /// Base URL, e.g. `http://localhost:11434`. Left as-is (even when empty);
    /// clients decide how to treat a missing value.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl OllamaSettings {
    /// Create settings for an explicit endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        OllamaSettings {
            endpoint: Some(endpoint.into()),
        }
    }

    /// Load settings from the process environment
    ///
    /// A `.env` file in the working directory (or a parent) is loaded first;
    /// variables already set in the environment take precedence over it.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Failed to load .env file: {}", e);
            }
        }
        Self::from_var(OLLAMA_ENDPOINT_VAR)
    }

    /// Read the endpoint from the named environment variable
    pub fn from_var(name: &str) -> Self {
        OllamaSettings {
            endpoint: std::env::var(name).ok(),
        }
    }

    /// Get the configured endpoint, if any
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
}
