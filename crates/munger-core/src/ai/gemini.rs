//! Gemini backend implementation
//!
//! HTTP client for the Google Generative Language API
//! (`POST /v1beta/models/{model}:generateContent`). The API key travels in the
//! `x-goog-api-key` header rather than the query string so it stays out of
//! URLs that end up in error messages.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::types::GenerationParams;
use super::{ensure_prompt, non_empty_reply, ReasoningBackend};

/// Public endpoint of the Generative Language API
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini backend
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiBackend {
    /// Create a new Gemini backend against the public endpoint
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_client(Client::new(), api_key, model)
    }

    /// Create with a preconfigured HTTP client (timeouts etc.)
    pub fn with_client(http_client: Client, api_key: &str, model: &str) -> Self {
        Self {
            http_client,
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// Point at a different endpoint (proxies, test servers)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        Some(text)
    }
}

#[async_trait]
impl ReasoningBackend for GeminiBackend {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        ensure_prompt(prompt)?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
            },
        };

        let response = self
            .http_client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Service(format!("Gemini API error {}: {}", status, body)));
        }

        let gemini_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::Service(format!("Unreadable Gemini response: {}", e)))?;

        let text = gemini_response
            .into_text()
            .ok_or_else(|| Error::Service("No response returned from the Gemini model".into()))?;
        debug!("Gemini response: {}", text);

        non_empty_reply(text, "the Gemini model")
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/v1beta/models/{}", self.base_url, self.model))
            .header("x-goog-api-key", &self.api_key)
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
