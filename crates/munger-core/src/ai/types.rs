//! AI backend request types
//!
//! These types are backend-agnostic and used across all AI implementations.

use serde::{Deserialize, Serialize};

/// Sampling parameters sent with each generation call
///
/// The pipeline always uses the same constants; the client forwards whatever
/// it is given without enforcing them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_output_tokens: 512,
        }
    }
}

/// Backend identity for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendInfo {
    /// Backend kind (gemini, ollama, ...)
    pub backend: String,
    /// Model name sent with each request
    pub model: String,
    /// Base URL the backend talks to
    pub host: String,
}
