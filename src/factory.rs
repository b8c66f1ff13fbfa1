//! Client creation from prompt configs

use super::{
    client::{ChatClient, ClientHandle, CompletionClient, EmbeddingsClient},
    config::{ModelType, OllamaSettings, PromptConfig, RawPromptConfig},
    sink::{StdoutSink, TokenSink},
    Result,
};
use std::sync::Arc;

/// Create a client for the config's model type, streaming generated text to
/// standard output.
///
/// No request is sent here; the endpoint is first contacted when the returned
/// client is used.
pub fn load_client(config: &PromptConfig, settings: &OllamaSettings) -> Result<ClientHandle> {
    load_client_with_sink(config, settings, Arc::new(StdoutSink))
}

/// Create a client for the config's model type, streaming generated text to
/// `sink`. Embeddings clients ignore the sink.
pub fn load_client_with_sink(
    config: &PromptConfig,
    settings: &OllamaSettings,
    sink: Arc<dyn TokenSink>,
) -> Result<ClientHandle> {
    let model = config.model_name.clone();
    let temperature = config.parameters.temperature;

    let handle = match config.model_type {
        ModelType::Chat => {
            ClientHandle::Chat(ChatClient::new(settings, model, temperature, sink)?)
        }
        ModelType::Completion => {
            ClientHandle::Completion(CompletionClient::new(settings, model, temperature, sink)?)
        }
        ModelType::Embeddings => ClientHandle::Embeddings(EmbeddingsClient::new(settings, model)?),
    };

    tracing::debug!(
        model_type = %handle.model_type(),
        model = handle.model(),
        base_url = handle.base_url(),
        "Created Ollama client"
    );
    Ok(handle)
}

/// Create a client from an untyped config, e.g. one deserialized from a file.
///
/// Fails with [`crate::Error::NotSupported`] when the model type is unknown.
pub fn load_client_from_raw(raw: RawPromptConfig, settings: &OllamaSettings) -> Result<ClientHandle> {
    let config = PromptConfig::try_from(raw)?;
    load_client(&config, settings)
}
