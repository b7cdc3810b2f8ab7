//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use munger_core::{DebtStatus, FinancialContext, Urgency};

/// Munger - Should you buy it?
#[derive(Parser)]
#[command(name = "munger")]
#[command(about = "Purchase decision scoring backed by a language model", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Reasoning config file (defaults to the data dir, if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend override: gemini, ollama, openai_compatible, mock
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Model override
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate a purchase
    Evaluate {
        /// What you want to buy
        #[arg(short, long)]
        item: String,

        /// Price in dollars
        #[arg(short, long)]
        cost: f64,

        #[command(flatten)]
        context: ContextArgs,

        /// Free-text notes passed to the model
        #[arg(long)]
        extra: Option<String>,

        /// Print the full assessment as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the example purchases
    Samples {
        /// Evaluate the examples against the configured backend
        #[arg(long)]
        run: bool,

        /// Only run the example for this item (e.g. "Designer Watch")
        #[arg(long, requires = "run")]
        item: Option<String>,
    },

    /// Manage prompt templates
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },

    /// Check that the reasoning backend is reachable
    Check,
}

/// Financial context flags
///
/// Either all four are given (the model is not asked to guess) or none are.
#[derive(Args, Debug, Clone, Default)]
pub struct ContextArgs {
    /// Monthly income left over after expenses
    #[arg(long, requires_all = ["debt", "goal", "urgency"])]
    pub leftover_income: Option<f64>,

    /// Carrying high-interest debt: yes or no
    #[arg(long, requires_all = ["leftover_income", "goal", "urgency"])]
    pub debt: Option<String>,

    /// Main financial goal
    #[arg(long, requires_all = ["leftover_income", "debt", "urgency"])]
    pub goal: Option<String>,

    /// Purchase urgency: urgent, wants, mixed
    #[arg(long, requires_all = ["leftover_income", "debt", "goal"])]
    pub urgency: Option<String>,
}

impl ContextArgs {
    /// Build the supplied context, or None when the model should infer it
    pub fn to_context(&self) -> Result<Option<FinancialContext>> {
        match (
            self.leftover_income,
            self.debt.as_deref(),
            self.goal.as_deref(),
            self.urgency.as_deref(),
        ) {
            (None, None, None, None) => Ok(None),
            (Some(income), Some(debt), Some(goal), Some(urgency)) => {
                if !income.is_finite() || income < 0.0 {
                    bail!("--leftover-income must be zero or more, got {}", income);
                }
                let debt: DebtStatus = debt.parse().map_err(anyhow::Error::msg)?;
                let urgency: Urgency = urgency.parse().map_err(anyhow::Error::msg)?;
                if goal.trim().is_empty() {
                    bail!("--goal must not be empty");
                }
                Ok(Some(FinancialContext::new(income, debt, goal.trim(), urgency)))
            }
            _ => bail!("--leftover-income, --debt, --goal and --urgency must be given together"),
        }
    }
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all available prompts and their override status
    List,

    /// Show the content of a specific prompt
    Show {
        /// Prompt ID (infer_context or score_factors)
        prompt_id: String,
    },

    /// Show the path where prompt overrides should be placed
    Path,
}
