//! OpenAI-compatible backend implementation
//!
//! Works with any server that implements the OpenAI chat completions API:
//! - vLLM (http://localhost:8000)
//! - LocalAI (http://localhost:8080)
//! - llama-server / llama.cpp (http://localhost:8080)
//! - text-generation-inference

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::types::GenerationParams;
use super::{ensure_prompt, non_empty_reply, ReasoningBackend};

/// OpenAI-compatible backend
///
/// Sends the prompt as a single user message to `/v1/chat/completions`.
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAICompatibleBackend {
    /// Create a new OpenAI-compatible backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self::with_client(Client::new(), base_url, model, None)
    }

    /// Create with a preconfigured HTTP client and optional API key
    pub fn with_client(
        http_client: Client,
        base_url: &str,
        model: &str,
        api_key: Option<&str>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.map(str::to_string),
        }
    }
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

/// Chat message
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

/// Chat completion choice
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

/// Chat response message
#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ReasoningBackend for OpenAICompatibleBackend {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        ensure_prompt(prompt)?;

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            max_tokens: params.max_output_tokens,
            stream: false,
        };

        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Service(format!(
                "OpenAI API error {}: {}",
                status, body
            )));
        }

        let chat_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Service(format!("Unreadable OpenAI response: {}", e)))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Service("No response from OpenAI API".into()))?;
        debug!("OpenAI-compatible response: {}", content);

        non_empty_reply(content, "OpenAI API")
    }

    async fn health_check(&self) -> bool {
        // Try /v1/models first (standard OpenAI endpoint)
        if let Ok(resp) = self
            .http_client
            .get(format!("{}/v1/models", self.base_url))
            .send()
            .await
        {
            if resp.status().is_success() {
                return true;
            }
        }

        // Try /health (common for LocalAI, llama-server)
        match self
            .http_client
            .get(format!("{}/health", self.base_url))
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
    async fn test_generate_chat_completion() {
        let server =
            MockReasoningServer::start_with(ServerMode::Reply(r#"{"ok": true}"#.into())).await;
        let backend = OpenAICompatibleBackend::with_client(
            Client::new(),
            &server.url(),
            "qwen2.5",
            Some("sk-test"),
        );

        let text = backend
            .generate("rate this", &GenerationParams::default())
            .await
            .unwrap();
        assert_eq!(text, r#"{"ok": true}"#);

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].prompt, "rate this");
        assert_eq!(requests[0].max_output_tokens, Some(512));
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer sk-test"));
    }

    #[tokio::test]
    async fn test_generate_error_status() {
        let server = MockReasoningServer::start_with(ServerMode::Fail).await;
        let backend = OpenAICompatibleBackend::new(&server.url(), "qwen2.5");
        let err = backend
            .generate("rate this", &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Service(_)));
    }

    #[tokio::test]
    async fn test_unreachable_is_http_error() {
        let backend = OpenAICompatibleBackend::new("http://127.0.0.1:1", "qwen2.5");
        let err = backend
            .generate("rate this", &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)));
        assert!(!backend.health_check().await);
    }
}
