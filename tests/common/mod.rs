//! Mock Ollama server for testing clients offline
#![allow(dead_code)]

use prompt_llm::OllamaSettings;
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Ollama mock server for testing
pub struct OllamaMockServer {
    server: MockServer,
}

impl OllamaMockServer {
    /// Create a new Ollama mock server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Get the base URL of this mock server
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Settings pointing at this mock server
    pub fn settings(&self) -> OllamaSettings {
        OllamaSettings::new(self.base_url())
    }

    /// Setup a streaming `/api/chat` response, one NDJSON line per chunk
    pub async fn mock_chat_streaming(&self, model: &str, chunks: &[&str]) {
        let lines: Vec<Value> = chunks
            .iter()
            .map(|chunk| {
                json!({
                    "model": model,
                    "created_at": "2024-01-01T00:00:00Z",
                    "message": { "role": "assistant", "content": chunk },
                    "done": false
                })
            })
            .chain(std::iter::once(json!({
                "model": model,
                "created_at": "2024-01-01T00:00:00Z",
                "message": { "role": "assistant", "content": "" },
                "done": true,
                "done_reason": "stop",
                "prompt_eval_count": 10,
                "eval_count": chunks.len()
            })))
            .collect();

        self.mount_ndjson("/api/chat", &lines).await;
    }

    /// Setup a streaming `/api/generate` response, one NDJSON line per chunk
    pub async fn mock_generate_streaming(&self, model: &str, chunks: &[&str]) {
        let lines: Vec<Value> = chunks
            .iter()
            .map(|chunk| {
                json!({
                    "model": model,
                    "created_at": "2024-01-01T00:00:00Z",
                    "response": chunk,
                    "done": false
                })
            })
            .chain(std::iter::once(json!({
                "model": model,
                "created_at": "2024-01-01T00:00:00Z",
                "response": "",
                "done": true,
                "prompt_eval_count": 5,
                "eval_count": chunks.len()
            })))
            .collect();

        self.mount_ndjson("/api/generate", &lines).await;
    }

    /// Setup an `/api/embed` response
    pub async fn mock_embed(&self, model: &str, embeddings: Vec<Vec<f32>>) {
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": model,
                "embeddings": embeddings
            })))
            .mount(&self.server)
            .await;
    }

    /// Setup an error response for any POST to `endpoint`
    pub async fn mock_error(&self, endpoint: &str, status: u16, message: &str) {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "error": message })))
            .mount(&self.server)
            .await;
    }

    /// Setup a raw NDJSON body for `endpoint`
    pub async fn mock_raw_stream(&self, endpoint: &str, body: &str) {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
            .mount(&self.server)
            .await;
    }

    /// Setup a raw byte body for `endpoint`, which need not be valid UTF-8
    pub async fn mock_raw_bytes(&self, endpoint: &str, body: Vec<u8>) {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
            .mount(&self.server)
            .await;
    }

    /// JSON bodies of all requests received so far
    pub async fn received_bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| serde_json::from_slice(&request.body).unwrap_or(Value::Null))
            .collect()
    }

    async fn mount_ndjson(&self, endpoint: &str, lines: &[Value]) {
        let body: String = lines.iter().map(|line| format!("{}\n", line)).collect();
        self.mock_raw_stream(endpoint, &body).await;
    }
}
