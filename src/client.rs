//! Ollama client implementations

use super::{
    config::{ModelType, OllamaSettings},
    message::Message,
    sink::TokenSink,
    Error, Result, Usage,
};
use futures::stream::{self, Stream, StreamExt};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

/// Base URL used when no endpoint is configured
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

/// Stream of generation events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Build an HTTP client for a local serving endpoint
fn build_http_client() -> std::result::Result<HttpClient, reqwest::Error> {
    HttpClient::builder().no_proxy().build()
}

/// Effective base URL for a configured endpoint
fn resolve_base_url(endpoint: Option<&str>) -> String {
    match endpoint.map(|e| e.trim().trim_end_matches('/')) {
        Some(e) if !e.is_empty() => e.to_string(),
        _ => DEFAULT_OLLAMA_ENDPOINT.to_string(),
    }
}

fn api_error(status: reqwest::StatusCode, body: &str) -> Error {
    Error::Api(format!("Ollama API error ({}): {}", status, body))
}

// ---------------------------------------------------------------------------
// NDJSON stream decoding, shared by /api/chat and /api/generate
// ---------------------------------------------------------------------------

/// Accumulates bytes from an HTTP response and yields complete JSON lines.
struct NdjsonBuffer {
    buf: Vec<u8>,
}

impl NdjsonBuffer {
    fn new() -> Self {
        Self {
            buf: Vec::with_capacity(4096),
        }
    }

    fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Extract the next complete, non-empty line (terminated by `\n`).
    /// Returns `None` when no complete line is available yet.
    ///
    /// Lines are only decoded once complete, so multi-byte characters split
    /// across chunk boundaries survive. Lines that are not valid UTF-8 are
    /// skipped with a warning rather than replaced with U+FFFD.
    fn next_line(&mut self) -> Option<String> {
        loop {
            let pos = self.buf.iter().position(|&b| b == b'\n')?;
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = match std::str::from_utf8(&raw) {
                Ok(s) => s.trim(),
                Err(e) => {
                    tracing::warn!("Skipping Ollama stream line with invalid UTF-8: {}", e);
                    continue;
                }
            };
            if !line.is_empty() {
                return Some(line.to_string());
            }
        }
    }
}

/// One line of an Ollama streaming response.
///
/// `/api/chat` carries text in `message.content`, `/api/generate` in
/// `response`. The final line has `done: true` and the evaluation counters.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

/// Decode one NDJSON line. `None` means the line was skipped.
fn decode_line(line: &str) -> Option<Result<StreamEvent>> {
    let chunk: StreamChunk = match serde_json::from_str(line) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::warn!("Failed to parse Ollama stream line: {}", e);
            return None;
        }
    };

    if let Some(message) = chunk.error {
        return Some(Err(Error::Api(format!("Ollama error: {}", message))));
    }

    let usage = if chunk.done {
        Some(Usage::from_eval_counts(
            chunk.prompt_eval_count.unwrap_or(0),
            chunk.eval_count.unwrap_or(0),
        ))
    } else {
        None
    };

    let delta = chunk
        .message
        .map(|m| m.content)
        .or(chunk.response)
        .unwrap_or_default();

    Some(Ok(StreamEvent {
        delta,
        done: chunk.done,
        usage,
    }))
}

/// Send a streaming request and decode the NDJSON response into events.
fn ndjson_events(request: reqwest::RequestBuilder) -> EventStream {
    Box::pin(async_stream::stream! {
        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                yield Err(Error::from(e));
                return;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            yield Err(api_error(status, &body));
            return;
        }

        // A final newline flushes a last line the server left unterminated.
        let mut bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()))
            .chain(stream::iter(std::iter::once(Ok::<_, reqwest::Error>(b"\n".to_vec()))));
        let mut lines = NdjsonBuffer::new();

        while let Some(chunk_result) = bytes.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    yield Err(Error::from(e));
                    return;
                }
            };

            lines.extend(&chunk);

            while let Some(line) = lines.next_line() {
                match decode_line(&line) {
                    Some(Ok(event)) => {
                        let done = event.done;
                        if !event.delta.is_empty() || done {
                            yield Ok(event);
                        }
                        if done {
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        yield Err(e);
                        return;
                    }
                    None => {}
                }
            }
        }

        tracing::warn!("Ollama stream ended without a done marker");
    })
}

/// Drain an event stream into the sink, returning the full text and usage.
///
/// `on_end` fires once after the last event. On a stream error it fires only
/// if some text already reached the sink.
async fn collect_streamed(mut events: EventStream, sink: &dyn TokenSink) -> Result<(String, Usage)> {
    let mut text = String::new();
    let mut usage = Usage::default();

    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                // Close off partial output before reporting the failure.
                if !text.is_empty() {
                    sink.on_end()?;
                }
                return Err(e);
            }
        };
        if !event.delta.is_empty() {
            sink.on_token(&event.delta)?;
            text.push_str(&event.delta);
        }
        if let Some(u) = event.usage {
            usage = u;
        }
        if event.done {
            break;
        }
    }

    sink.on_end()?;
    Ok((text, usage))
}

/// Streaming event from the LLM
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    /// Text delta for this event
    pub delta: String,

    /// Whether this is the final event
    pub done: bool,

    /// Token usage (only available in the final event)
    pub usage: Option<Usage>,
}

/// Common view over every Ollama client
pub trait Client: Send + Sync {
    /// Model type this client serves
    fn model_type(&self) -> ModelType;

    /// Endpoint as configured, before defaulting
    fn endpoint(&self) -> Option<&str>;

    /// Effective base URL requests are sent to
    fn base_url(&self) -> &str;

    /// Model identifier
    fn model(&self) -> &str;
}

/// Endpoint, model and HTTP client shared by all client kinds
#[derive(Debug, Clone)]
struct Connection {
    endpoint: Option<String>,
    base_url: String,
    model: String,
    http_client: HttpClient,
}

impl Connection {
    fn new(settings: &OllamaSettings, model: String) -> Result<Self> {
        Ok(Connection {
            endpoint: settings.endpoint.clone(),
            base_url: resolve_base_url(settings.endpoint()),
            model,
            http_client: build_http_client()?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Ollama generation options
#[derive(Debug, Serialize)]
struct GenerationOptions {
    temperature: f64,
}

fn generation_options(temperature: Option<f64>) -> Option<GenerationOptions> {
    temperature.map(|temperature| GenerationOptions { temperature })
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Multi-turn chat client (`/api/chat`)
#[derive(Clone)]
pub struct ChatClient {
    conn: Connection,
    temperature: Option<f64>,
    sink: Arc<dyn TokenSink>,
}

impl ChatClient {
    /// Create a new chat client
    pub fn new(
        settings: &OllamaSettings,
        model: impl Into<String>,
        temperature: Option<f64>,
        sink: Arc<dyn TokenSink>,
    ) -> Result<Self> {
        Ok(ChatClient {
            conn: Connection::new(settings, model.into())?,
            temperature,
            sink,
        })
    }

    /// Get the sampling temperature, if set
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    /// Chat output is always streamed to the sink
    pub fn is_streaming(&self) -> bool {
        true
    }

    /// Send the conversation and stream back the reply
    pub fn stream(&self, messages: &[Message]) -> EventStream {
        let url = self.conn.url("/api/chat");
        tracing::debug!(model = %self.conn.model, %url, messages = messages.len(), "Sending chat request");

        let request = ChatRequest {
            model: &self.conn.model,
            messages,
            stream: true,
            options: generation_options(self.temperature),
        };
        ndjson_events(self.conn.http_client.post(&url).json(&request))
    }

    /// Send the conversation, writing the reply to the sink as it streams in.
    /// Returns the complete reply and token usage.
    pub async fn invoke(&self, messages: &[Message]) -> Result<(String, Usage)> {
        collect_streamed(self.stream(messages), self.sink.as_ref()).await
    }
}

impl Client for ChatClient {
    fn model_type(&self) -> ModelType {
        ModelType::Chat
    }

    fn endpoint(&self) -> Option<&str> {
        self.conn.endpoint.as_deref()
    }

    fn base_url(&self) -> &str {
        &self.conn.base_url
    }

    fn model(&self) -> &str {
        &self.conn.model
    }
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.conn.endpoint)
            .field("model", &self.conn.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

/// Single-shot completion client (`/api/generate`)
#[derive(Clone)]
pub struct CompletionClient {
    conn: Connection,
    temperature: Option<f64>,
    sink: Arc<dyn TokenSink>,
}

impl CompletionClient {
    /// Create a new completion client
    pub fn new(
        settings: &OllamaSettings,
        model: impl Into<String>,
        temperature: Option<f64>,
        sink: Arc<dyn TokenSink>,
    ) -> Result<Self> {
        Ok(CompletionClient {
            conn: Connection::new(settings, model.into())?,
            temperature,
            sink,
        })
    }

    /// Get the sampling temperature, if set
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    /// Completion output is always streamed to the sink
    pub fn is_streaming(&self) -> bool {
        true
    }

    /// Send the prompt and stream back the completion
    pub fn stream(&self, prompt: &str) -> EventStream {
        let url = self.conn.url("/api/generate");
        tracing::debug!(model = %self.conn.model, %url, "Sending completion request");

        let request = GenerateRequest {
            model: &self.conn.model,
            prompt,
            stream: true,
            options: generation_options(self.temperature),
        };
        ndjson_events(self.conn.http_client.post(&url).json(&request))
    }

    /// Send the prompt, writing the completion to the sink as it streams in.
    /// Returns the complete text and token usage.
    pub async fn invoke(&self, prompt: &str) -> Result<(String, Usage)> {
        collect_streamed(self.stream(prompt), self.sink.as_ref()).await
    }
}

impl Client for CompletionClient {
    fn model_type(&self) -> ModelType {
        ModelType::Completion
    }

    fn endpoint(&self) -> Option<&str> {
        self.conn.endpoint.as_deref()
    }

    fn base_url(&self) -> &str {
        &self.conn.base_url
    }

    fn model(&self) -> &str {
        &self.conn.model
    }
}

impl fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionClient")
            .field("endpoint", &self.conn.endpoint)
            .field("model", &self.conn.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

/// Embeddings client (`/api/embed`)
#[derive(Debug, Clone)]
pub struct EmbeddingsClient {
    conn: Connection,
}

impl EmbeddingsClient {
    /// Create a new embeddings client
    pub fn new(settings: &OllamaSettings, model: impl Into<String>) -> Result<Self> {
        Ok(EmbeddingsClient {
            conn: Connection::new(settings, model.into())?,
        })
    }

    /// Embed a batch of documents, one vector per input in input order
    pub async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.conn.url("/api/embed");
        tracing::debug!(model = %self.conn.model, %url, inputs = texts.len(), "Sending embed request");

        let request = EmbedRequest {
            model: &self.conn.model,
            input: texts,
        };
        let response = self.conn.http_client.post(&url).json(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        let response: EmbedResponse = serde_json::from_str(&body).map_err(|e| {
            Error::Api(format!("Failed to parse Ollama embed response: {}. Body: {}", e, body))
        })?;

        if response.embeddings.len() != texts.len() {
            return Err(Error::Api(format!(
                "Ollama returned {} embeddings for {} inputs",
                response.embeddings.len(),
                texts.len()
            )));
        }

        Ok(response.embeddings)
    }

    /// Embed a single query text
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_documents(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| Error::Api("Ollama returned no embedding".to_string()))
    }
}

impl Client for EmbeddingsClient {
    fn model_type(&self) -> ModelType {
        ModelType::Embeddings
    }

    fn endpoint(&self) -> Option<&str> {
        self.conn.endpoint.as_deref()
    }

    fn base_url(&self) -> &str {
        &self.conn.base_url
    }

    fn model(&self) -> &str {
        &self.conn.model
    }
}

/// A configured client for one model type
#[derive(Debug, Clone)]
pub enum ClientHandle {
    /// Multi-turn chat
    Chat(ChatClient),
    /// Single-shot completion
    Completion(CompletionClient),
    /// Embeddings
    Embeddings(EmbeddingsClient),
}

impl ClientHandle {
    fn as_client(&self) -> &dyn Client {
        match self {
            ClientHandle::Chat(c) => c,
            ClientHandle::Completion(c) => c,
            ClientHandle::Embeddings(c) => c,
        }
    }

    /// Model type of the wrapped client
    pub fn model_type(&self) -> ModelType {
        self.as_client().model_type()
    }

    /// Endpoint as configured, before defaulting
    pub fn endpoint(&self) -> Option<&str> {
        self.as_client().endpoint()
    }

    /// Effective base URL
    pub fn base_url(&self) -> &str {
        self.as_client().base_url()
    }

    /// Model identifier
    pub fn model(&self) -> &str {
        self.as_client().model()
    }

    /// Sampling temperature; always `None` for embeddings
    pub fn temperature(&self) -> Option<f64> {
        match self {
            ClientHandle::Chat(c) => c.temperature(),
            ClientHandle::Completion(c) => c.temperature(),
            ClientHandle::Embeddings(_) => None,
        }
    }

    /// Whether generated output is streamed to a sink
    pub fn is_streaming(&self) -> bool {
        match self {
            ClientHandle::Chat(c) => c.is_streaming(),
            ClientHandle::Completion(c) => c.is_streaming(),
            ClientHandle::Embeddings(_) => false,
        }
    }

    /// Borrow the chat client, if this is a chat handle
    pub fn as_chat(&self) -> Option<&ChatClient> {
        match self {
            ClientHandle::Chat(c) => Some(c),
            _ => None,
        }
    }

    /// Borrow the completion client, if this is a completion handle
    pub fn as_completion(&self) -> Option<&CompletionClient> {
        match self {
            ClientHandle::Completion(c) => Some(c),
            _ => None,
        }
    }

    /// Borrow the embeddings client, if this is an embeddings handle
    pub fn as_embeddings(&self) -> Option<&EmbeddingsClient> {
        match self {
            ClientHandle::Embeddings(c) => Some(c),
            _ => None,
        }
    }

    /// Take the chat client, if this is a chat handle
    pub fn into_chat(self) -> Option<ChatClient> {
        match self {
            ClientHandle::Chat(c) => Some(c),
            _ => None,
        }
    }

    /// Take the completion client, if this is a completion handle
    pub fn into_completion(self) -> Option<CompletionClient> {
        match self {
            ClientHandle::Completion(c) => Some(c),
            _ => None,
        }
    }

    /// Take the embeddings client, if this is an embeddings handle
    pub fn into_embeddings(self) -> Option<EmbeddingsClient> {
        match self {
            ClientHandle::Embeddings(c) => Some(c),
            _ => None,
        }
    }
}
