//! Pluggable reasoning-service backend abstraction
//!
//! The pipeline only ever needs one operation from a language model: send a
//! prompt, get raw text back. This module provides that operation over a few
//! HTTP APIs plus an offline mock.
//!
//! # Architecture
//!
//! - `ReasoningBackend` trait: defines the interface for all backends
//! - `ReasoningClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `OllamaBackend`,
//!   `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = ReasoningConfig::load(None)?;
//! let client = ReasoningClient::from_config(&config)?;
//! let text = client.generate("Say hi", &GenerationParams::default()).await?;
//! ```

mod gemini;
mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use gemini::GeminiBackend;
pub use mock::{MockBackend, MockReply};
#[cfg(any(test, feature = "test-utils"))]
pub(crate) use mock::canned_reply;
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use parsing::{extract_json_object, JsonObject};
pub use types::*;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::{BackendKind, ReasoningConfig};
use crate::error::{Error, Result};

/// Default Ollama host when none is configured
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Trait defining the interface for all reasoning backends
///
/// A call is a single request/response exchange: no retries, no state kept
/// between calls. Backends should be Send + Sync to allow use across async
/// tasks.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Send `prompt` and return the raw text of the reply
    ///
    /// Fails with `Error::InvalidData` for an empty prompt (no call is made)
    /// and with a service-level error when the backend is unreachable, answers
    /// with a non-success status, or returns no text.
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete reasoning client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum ReasoningClient {
    /// Google Generative Language API
    Gemini(GeminiBackend),
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// OpenAI-compatible backend (vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl ReasoningClient {
    /// Build a client from an explicit configuration
    ///
    /// Gemini requires an API key; OpenAI-compatible servers require a host.
    /// Ollama falls back to `http://localhost:11434`.
    pub fn from_config(config: &ReasoningConfig) -> Result<Self> {
        let http = http_client(config.timeout())?;

        match config.backend {
            BackendKind::Gemini => {
                let api_key = config.api_key.as_deref().ok_or_else(|| {
                    Error::Config(
                        "Gemini backend requires an API key (MUNGER_API_KEY or GOOGLE_API_KEY)"
                            .into(),
                    )
                })?;
                let mut backend = GeminiBackend::with_client(http, api_key, &config.model_name);
                if let Some(ref host) = config.host {
                    backend = backend.with_base_url(host);
                }
                Ok(ReasoningClient::Gemini(backend))
            }
            BackendKind::Ollama => {
                let host = config.host.as_deref().unwrap_or(DEFAULT_OLLAMA_HOST);
                Ok(ReasoningClient::Ollama(OllamaBackend::with_client(
                    http,
                    host,
                    &config.model_name,
                )))
            }
            BackendKind::OpenaiCompatible => {
                let host = config.host.as_deref().ok_or_else(|| {
                    Error::Config("OpenAI-compatible backend requires a host (MUNGER_HOST)".into())
                })?;
                Ok(ReasoningClient::OpenAICompatible(
                    OpenAICompatibleBackend::with_client(
                        http,
                        host,
                        &config.model_name,
                        config.api_key.as_deref(),
                    ),
                ))
            }
            BackendKind::Mock => Ok(ReasoningClient::Mock(MockBackend::new())),
        }
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        ReasoningClient::Mock(MockBackend::new())
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            ReasoningClient::Gemini(_) => BackendKind::Gemini,
            ReasoningClient::Ollama(_) => BackendKind::Ollama,
            ReasoningClient::OpenAICompatible(_) => BackendKind::OpenaiCompatible,
            ReasoningClient::Mock(_) => BackendKind::Mock,
        }
    }

    /// Backend identity for display
    pub fn info(&self) -> BackendInfo {
        BackendInfo {
            backend: self.kind().to_string(),
            model: self.model().to_string(),
            host: self.host().to_string(),
        }
    }
}

fn http_client(timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Reject empty prompts before any network traffic
pub(crate) fn ensure_prompt(prompt: &str) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(Error::InvalidData("Prompt must not be empty".into()));
    }
    Ok(())
}

/// Turn a blank reply into a service error
pub(crate) fn non_empty_reply(text: String, backend: &str) -> Result<String> {
    if text.trim().is_empty() {
        Err(Error::Service(format!("No response returned from {}", backend)))
    } else {
        Ok(text)
    }
}

// Implement ReasoningBackend for ReasoningClient by delegating to the inner backend
#[async_trait]
impl ReasoningBackend for ReasoningClient {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        match self {
            ReasoningClient::Gemini(b) => b.generate(prompt, params).await,
            ReasoningClient::Ollama(b) => b.generate(prompt, params).await,
            ReasoningClient::OpenAICompatible(b) => b.generate(prompt, params).await,
            ReasoningClient::Mock(b) => b.generate(prompt, params).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            ReasoningClient::Gemini(b) => b.health_check().await,
            ReasoningClient::Ollama(b) => b.health_check().await,
            ReasoningClient::OpenAICompatible(b) => b.health_check().await,
            ReasoningClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            ReasoningClient::Gemini(b) => b.model(),
            ReasoningClient::Ollama(b) => b.model(),
            ReasoningClient::OpenAICompatible(b) => b.model(),
            ReasoningClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            ReasoningClient::Gemini(b) => b.host(),
            ReasoningClient::Ollama(b) => b.host(),
            ReasoningClient::OpenAICompatible(b) => b.host(),
            ReasoningClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasoning_client_mock() {
        let client = ReasoningClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
        assert_eq!(client.kind(), BackendKind::Mock);
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let client = ReasoningClient::mock();
        assert!(client.health_check().await);
    }

    #[test]
    fn test_from_config_gemini_requires_key() {
        let config = ReasoningConfig::default();
        let err = ReasoningClient::from_config(&config).err().unwrap();
        assert!(matches!(err, Error::Config(_)));

        let config = ReasoningConfig {
            api_key: Some("key".into()),
            ..ReasoningConfig::default()
        };
        let client = ReasoningClient::from_config(&config).unwrap();
        assert_eq!(client.kind(), BackendKind::Gemini);
        assert_eq!(client.model(), "gemini-2.0-flash");
    }

    #[test]
    fn test_from_config_ollama_default_host() {
        let config = ReasoningConfig {
            backend: BackendKind::Ollama,
            model_name: "llama3.2".into(),
            ..ReasoningConfig::default()
        };
        let client = ReasoningClient::from_config(&config).unwrap();
        assert_eq!(client.host(), DEFAULT_OLLAMA_HOST);
    }

    #[test]
    fn test_from_config_openai_requires_host() {
        let config = ReasoningConfig {
            backend: BackendKind::OpenaiCompatible,
            model_name: "gpt-3.5-turbo".into(),
            ..ReasoningConfig::default()
        };
        assert!(ReasoningClient::from_config(&config).is_err());

        let config = ReasoningConfig {
            host: Some("http://localhost:8000/".into()),
            ..config
        };
        let client = ReasoningClient::from_config(&config).unwrap();
        assert_eq!(client.host(), "http://localhost:8000");
    }

    #[test]
    fn test_ensure_prompt() {
        assert!(ensure_prompt("hello").is_ok());
        assert!(matches!(ensure_prompt("  \n"), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_non_empty_reply() {
        assert_eq!(non_empty_reply("ok".into(), "x").unwrap(), "ok");
        assert!(matches!(
            non_empty_reply("   ".into(), "x"),
            Err(Error::Service(_))
        ));
    }
}
