//! Ollama backend implementation
//!
//! HTTP client for the Ollama `/api/generate` endpoint with streaming disabled.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::types::GenerationParams;
use super::{ensure_prompt, non_empty_reply, ReasoningBackend};

/// Ollama backend
///
/// # Configuration
///
/// ```toml
/// backend = "ollama"
/// host = "http://localhost:11434"
/// model_name = "llama3.2"
/// ```
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self::with_client(Client::new(), base_url, model)
    }

    /// Create with a preconfigured HTTP client (timeouts etc.)
    pub fn with_client(http_client: Client, base_url: &str, model: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

/// Sampling options understood by Ollama
#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl ReasoningBackend for OllamaBackend {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        ensure_prompt(prompt)?;

        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: params.temperature,
                num_predict: params.max_output_tokens,
            },
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Service(format!("Ollama API error {}: {}", status, body)));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| Error::Service(format!("Unreadable Ollama response: {}", e)))?;
        debug!("Ollama response: {}", ollama_response.response);

        non_empty_reply(ollama_response.response, "Ollama")
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockReasoningServer, ServerMode};

    #[tokio::test]
    async fn test_generate_sends_params() {
        let server = MockReasoningServer::start_with(ServerMode::Reply("plain text".into())).await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2");

        let params = GenerationParams {
            temperature: 0.2,
            max_output_tokens: 512,
        };
        let text = backend.generate("hello", &params).await.unwrap();
        assert_eq!(text, "plain text");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].prompt, "hello");
        assert_eq!(requests[0].model.as_deref(), Some("llama3.2"));
        assert_eq!(requests[0].temperature, Some(0.2));
        assert_eq!(requests[0].max_output_tokens, Some(512));
    }

    #[tokio::test]
    async fn test_generate_error_status() {
        let server = MockReasoningServer::start_with(ServerMode::Fail).await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2");

        let err = backend
            .generate("hello", &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Service(_)));
    }

    #[tokio::test]
    async fn test_generate_empty_reply() {
        let server = MockReasoningServer::start_with(ServerMode::Reply(String::new())).await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2");

        let err = backend
            .generate("hello", &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Service(_)));
    }

    #[tokio::test]
    async fn test_empty_prompt_makes_no_call() {
        let server = MockReasoningServer::start().await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2");

        let err = backend
            .generate("", &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockReasoningServer::start().await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2");
        assert!(backend.health_check().await);

        let unreachable = OllamaBackend::new("http://127.0.0.1:1", "llama3.2");
        assert!(!unreachable.health_check().await);
    }
}
