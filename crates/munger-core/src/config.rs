//! Reasoning-service configuration
//!
//! The client never reads ambient global state; callers build a
//! `ReasoningConfig` and hand it to `ReasoningClient::from_config`.
//!
//! ## Configuration Resolution
//!
//! 1. Embedded defaults (compiled into binary)
//! 2. TOML file: explicit `--config` path, or
//!    `~/.local/share/munger/config/reasoning.toml` when it exists
//! 3. Environment: `MUNGER_BACKEND`, `MUNGER_MODEL`, `MUNGER_API_KEY`
//!    (`GOOGLE_API_KEY` also accepted for gemini), `MUNGER_HOST`,
//!    `MUNGER_TIMEOUT_SECS`

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::ai::GenerationParams;
use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/reasoning.toml");

/// Which reasoning backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Google Generative Language API
    #[default]
    Gemini,
    /// Ollama HTTP API
    Ollama,
    /// Any OpenAI `/v1/chat/completions` server
    OpenaiCompatible,
    /// Scripted offline backend
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
            Self::OpenaiCompatible => "openai_compatible",
            Self::Mock => "mock",
        }
    }

    /// Model used when none is configured
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.0-flash",
            Self::Ollama => "llama3.2",
            Self::OpenaiCompatible => "gpt-3.5-turbo",
            Self::Mock => "mock",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                Ok(Self::OpenaiCompatible)
            }
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown reasoning backend: {}", s)),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved configuration for the reasoning client
#[derive(Clone, PartialEq)]
pub struct ReasoningConfig {
    pub backend: BackendKind,
    pub model_name: String,
    pub api_key: Option<String>,
    pub host: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: Option<u64>,
}

// Hand-written so the API key never ends up in logs
impl std::fmt::Debug for ReasoningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasoningConfig")
            .field("backend", &self.backend)
            .field("model_name", &self.model_name)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        let params = GenerationParams::default();
        Self {
            backend: BackendKind::default(),
            model_name: BackendKind::default().default_model().to_string(),
            api_key: None,
            host: None,
            temperature: params.temperature,
            max_output_tokens: params.max_output_tokens,
            timeout_secs: None,
        }
    }
}

/// One layer of configuration as it appears in a TOML file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    backend: Option<BackendKind>,
    model_name: Option<String>,
    api_key: Option<String>,
    host: Option<String>,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
    timeout_secs: Option<u64>,
}

impl RawConfig {
    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid reasoning config: {}", e)))
    }

    /// Overlay `other` on top of `self`
    fn merge(&mut self, other: RawConfig) {
        if other.backend.is_some() {
            self.backend = other.backend;
        }
        if other.model_name.is_some() {
            self.model_name = other.model_name;
        }
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.temperature.is_some() {
            self.temperature = other.temperature;
        }
        if other.max_output_tokens.is_some() {
            self.max_output_tokens = other.max_output_tokens;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
    }

    fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let backend = get("MUNGER_BACKEND")
            .map(|b| b.parse::<BackendKind>().map_err(Error::Config))
            .transpose()?;
        let timeout_secs = get("MUNGER_TIMEOUT_SECS")
            .map(|t| {
                t.trim()
                    .parse::<u64>()
                    .map_err(|_| Error::Config(format!("Invalid MUNGER_TIMEOUT_SECS: {}", t)))
            })
            .transpose()?;

        Ok(Self {
            backend,
            model_name: get("MUNGER_MODEL"),
            api_key: get("MUNGER_API_KEY"),
            host: get("MUNGER_HOST"),
            temperature: None,
            max_output_tokens: None,
            timeout_secs,
        })
    }

    fn resolve(self) -> ReasoningConfig {
        let defaults = ReasoningConfig::default();
        let backend = self.backend.unwrap_or(defaults.backend);
        ReasoningConfig {
            backend,
            model_name: self
                .model_name
                .unwrap_or_else(|| backend.default_model().to_string()),
            api_key: self.api_key,
            host: self.host,
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_output_tokens: self.max_output_tokens.unwrap_or(defaults.max_output_tokens),
            timeout_secs: self.timeout_secs,
        }
    }
}

impl ReasoningConfig {
    /// Load embedded defaults, then the config file, then environment overrides
    ///
    /// An explicit `path` must exist. Without one, the default path is used
    /// only if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, |name| std::env::var(name).ok())
    }

    /// Same as `load`, with an injectable environment lookup
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut raw = RawConfig::parse(DEFAULT_CONFIG)?;

        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };
        if let Some(file) = file {
            let content = fs::read_to_string(&file).map_err(|e| {
                Error::Config(format!(
                    "Failed to read config {}: {}",
                    file.display(),
                    e
                ))
            })?;
            raw.merge(RawConfig::parse(&content)?);
            tracing::debug!(path = %file.display(), "Loaded reasoning config");
        }

        let env_layer = RawConfig::from_env_with(&lookup)?;
        let backend = env_layer.backend.or(raw.backend).unwrap_or_default();
        raw.merge(env_layer);

        // Gemini keys are commonly exported under Google's own name
        if raw.api_key.is_none() && backend == BackendKind::Gemini {
            raw.api_key = lookup("GOOGLE_API_KEY").filter(|v| !v.trim().is_empty());
        }

        Ok(raw.resolve())
    }

    /// Parse a TOML document layered over the embedded defaults (no env)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut raw = RawConfig::parse(DEFAULT_CONFIG)?;
        raw.merge(RawConfig::parse(content)?);
        Ok(raw.resolve())
    }

    /// Temperature and output length sent with every call
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("munger").join("config").join("reasoning.toml"))
}
