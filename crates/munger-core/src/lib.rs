//! Munger Core Library
//!
//! Purchase decision scoring backed by a language model:
//! - Pluggable reasoning-service backends (Gemini, Ollama, OpenAI-compatible)
//! - Tolerant JSON extraction from free-form model output
//! - Financial context inference with a deterministic fallback
//! - Five-factor scoring, PDS aggregation and recommendation mapping
//! - Prompt library with user overrides
//! - Diagnostic channel for fallback events

pub mod ai;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod inference;
pub mod insights;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod samples;
pub mod scoring;

/// Test utilities including a mock reasoning server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    extract_json_object, BackendInfo, GeminiBackend, GenerationParams, MockBackend, MockReply,
    OllamaBackend, OpenAICompatibleBackend, ReasoningBackend, ReasoningClient,
};
pub use config::{BackendKind, ReasoningConfig};
pub use diagnostics::{
    CollectingSink, DiagnosticEvent, DiagnosticKind, DiagnosticSink, NullSink, Stage, TracingSink,
};
pub use error::{Error, Result};
pub use inference::ContextInferencer;
pub use insights::{generate_insights, Insight};
pub use models::{
    compute_pds, recommend, ContextSource, DebtStatus, Decision, FactorKind, FactorScore,
    FactorSet, FactorSource, FinancialContext, PurchaseRequest, Recommendation, Tone, Urgency,
};
pub use pipeline::{Assessment, DecisionPipeline};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary, PromptSet};
pub use samples::{find_sample, sample_purchases, SamplePurchase};
pub use scoring::FactorScorer;
