//! Test utilities for munger-core
//!
//! This module provides a mock reasoning server that speaks just enough of
//! the Ollama, OpenAI-compatible and Gemini wire formats to exercise the HTTP
//! backends without a real model.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::ai::canned_reply;

/// API key the mock Gemini endpoints accept
pub const MOCK_API_KEY: &str = "test-api-key";

/// How the mock server answers generation requests
#[derive(Debug, Clone, Default)]
pub enum ServerMode {
    /// Canned JSON picked by prompt content
    #[default]
    Canned,
    /// Always answer with this text
    Reply(String),
    /// Answer every generation request with HTTP 500
    Fail,
}

/// A generation request as seen by the mock server
#[derive(Debug, Clone, Default)]
pub struct RecordedRequest {
    pub prompt: String,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub authorization: Option<String>,
}

#[derive(Clone)]
struct ServerState {
    mode: ServerMode,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ServerState {
    fn record(&self, request: RecordedRequest) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
    }

    /// Text to answer with, or None when the server should fail
    fn reply_for(&self, prompt: &str) -> Option<String> {
        match &self.mode {
            ServerMode::Canned => Some(canned_reply(prompt)),
            ServerMode::Reply(text) => Some(text.clone()),
            ServerMode::Fail => None,
        }
    }
}

/// Mock reasoning server for testing and development
pub struct MockReasoningServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockReasoningServer {
    /// Start the mock server on an available port with canned replies
    pub async fn start() -> Self {
        Self::start_with(ServerMode::Canned).await
    }

    /// Start the mock server with an explicit reply mode
    pub async fn start_with(mode: ServerMode) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = ServerState {
            mode,
            requests: requests.clone(),
        };

        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_ollama_generate))
            .route("/v1/models", get(handle_openai_models))
            .route("/v1/chat/completions", post(handle_chat_completions))
            .route(
                "/v1beta/models/*rest",
                get(handle_gemini_model).post(handle_gemini_generate),
            )
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Generation requests received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockReasoningServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "model crashed").into_response()
}

// Ollama

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<Value> {
    Json(json!({
        "models": [{
            "name": "llama3.2:latest",
            "modified_at": "2024-01-01T00:00:00Z",
            "size": 4_000_000_000u64
        }]
    }))
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    #[serde(default)]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Deserialize)]
struct OllamaOptions {
    temperature: Option<f32>,
    num_predict: Option<u32>,
}

#[derive(Debug, Serialize)]
struct OllamaGenerateResponse {
    model: String,
    response: String,
    done: bool,
}

async fn handle_ollama_generate(
    State(state): State<ServerState>,
    Json(request): Json<OllamaGenerateRequest>,
) -> Response {
    let options = request.options.as_ref();
    state.record(RecordedRequest {
        prompt: request.prompt.clone(),
        model: Some(request.model.clone()),
        temperature: options.and_then(|o| o.temperature),
        max_output_tokens: options.and_then(|o| o.num_predict),
        authorization: None,
    });

    match state.reply_for(&request.prompt) {
        Some(response) => Json(OllamaGenerateResponse {
            model: request.model,
            response,
            done: true,
        })
        .into_response(),
        None => server_error(),
    }
}

// OpenAI-compatible

async fn handle_openai_models() -> Json<Value> {
    Json(json!({ "object": "list", "data": [{ "id": "qwen2.5", "object": "model" }] }))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

async fn handle_chat_completions(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Response {
    let prompt = request
        .messages
        .last()
        .map(|m| m.content.clone())
        .unwrap_or_default();
    state.record(RecordedRequest {
        prompt: prompt.clone(),
        model: Some(request.model.clone()),
        temperature: request.temperature,
        max_output_tokens: request.max_tokens,
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    match state.reply_for(&prompt) {
        Some(content) => Json(json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "model": request.model,
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        }))
        .into_response(),
        None => server_error(),
    }
}

// Gemini

fn gemini_key_ok(headers: &HeaderMap) -> bool {
    headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|key| key == MOCK_API_KEY)
}

fn gemini_unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": { "code": 401, "message": "API key not valid", "status": "UNAUTHENTICATED" } })),
    )
        .into_response()
}

async fn handle_gemini_model(Path(rest): Path<String>, headers: HeaderMap) -> Response {
    if !gemini_key_ok(&headers) {
        return gemini_unauthorized();
    }
    Json(json!({ "name": format!("models/{}", rest) })).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(default)]
    contents: Vec<GeminiContent>,
    #[serde(default)]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

async fn handle_gemini_generate(
    State(state): State<ServerState>,
    Path(rest): Path<String>,
    headers: HeaderMap,
    Json(request): Json<GeminiRequest>,
) -> Response {
    if !gemini_key_ok(&headers) {
        return gemini_unauthorized();
    }

    let Some(model) = rest.strip_suffix(":generateContent") else {
        return (StatusCode::NOT_FOUND, "unknown method").into_response();
    };

    let prompt: String = request
        .contents
        .iter()
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.text.as_deref())
        .collect();
    let config = request.generation_config.as_ref();
    state.record(RecordedRequest {
        prompt: prompt.clone(),
        model: Some(model.to_string()),
        temperature: config.and_then(|c| c.temperature),
        max_output_tokens: config.and_then(|c| c.max_output_tokens),
        authorization: None,
    });

    match state.reply_for(&prompt) {
        Some(text) => Json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        }))
        .into_response(),
        None => server_error(),
    }
}
