//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `evaluate` - Score a single purchase
//! - `samples` - List or run the example purchases
//! - `prompts` - Prompt library management commands
//! - `check` - Backend health check
//!
//! Shared setup (config resolution, pipeline construction, the console
//! diagnostic sink) lives here.

pub mod check;
pub mod evaluate;
pub mod prompts;
pub mod samples;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use munger_core::{
    BackendKind, DecisionPipeline, DiagnosticEvent, DiagnosticSink, ReasoningConfig,
};

// Re-export command functions for main.rs
pub use check::*;
pub use evaluate::*;
pub use prompts::*;
pub use samples::*;

/// Prints fallback warnings to stderr so they never mix with `--json` output
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl DiagnosticSink for ConsoleSink {
    fn report(&self, event: &DiagnosticEvent) {
        tracing::debug!(stage = event.stage.as_str(), "Fallback used");
        eprintln!("⚠️  {}", event.message);
    }
}

/// Resolve configuration, then apply `--backend` / `--model`
pub fn load_config(
    path: Option<&Path>,
    backend: Option<&str>,
    model: Option<&str>,
) -> Result<ReasoningConfig> {
    let mut config = ReasoningConfig::load(path).context("Failed to load reasoning config")?;
    apply_overrides(&mut config, backend, model)?;
    Ok(config)
}

/// Command-line flags win over file and environment
pub fn apply_overrides(
    config: &mut ReasoningConfig,
    backend: Option<&str>,
    model: Option<&str>,
) -> Result<()> {
    if let Some(backend) = backend {
        let kind: BackendKind = backend.parse().map_err(anyhow::Error::msg)?;
        if kind != config.backend {
            config.backend = kind;
            // A model name only makes sense for the backend it was chosen for
            config.model_name = kind.default_model().to_string();
        }
    }
    if let Some(model) = model {
        config.model_name = model.to_string();
    }
    Ok(())
}

/// Build a pipeline that reports fallbacks on the console
pub fn build_pipeline(config: &ReasoningConfig) -> Result<DecisionPipeline> {
    DecisionPipeline::from_config(config, Arc::new(ConsoleSink))
        .context("Failed to set up the reasoning backend")
}

/// Format a dollar amount with thousands separators
pub fn format_money(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    let dollars = (cents / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, c) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}
