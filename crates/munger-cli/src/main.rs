//! Munger CLI - Purchase decision assistant
//!
//! Usage:
//!   munger evaluate --item NAME --cost N   Score a purchase
//!   munger samples [--run [--item NAME]]   List (or run) the example purchases
//!   munger prompts [list|show ID|path]     Inspect prompt templates
//!   munger check                           Check the reasoning backend

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use munger_core::PromptLibrary;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let load_config = || {
        commands::load_config(
            cli.config.as_deref(),
            cli.backend.as_deref(),
            cli.model.as_deref(),
        )
    };

    match &cli.command {
        Commands::Evaluate {
            item,
            cost,
            context,
            extra,
            json,
        } => {
            let context = context.to_context()?;
            let pipeline = commands::build_pipeline(&load_config()?)?;
            commands::cmd_evaluate(&pipeline, item, *cost, context, extra.as_deref(), *json).await
        }
        Commands::Samples { run: false, .. } => commands::cmd_samples_list(),
        Commands::Samples { run: true, item } => {
            let pipeline = commands::build_pipeline(&load_config()?)?;
            commands::cmd_samples_run(&pipeline, item.as_deref()).await
        }
        Commands::Prompts { action } => {
            let mut library = PromptLibrary::new();
            match action {
                None | Some(PromptsAction::List) => commands::cmd_prompts_list(&mut library),
                Some(PromptsAction::Show { prompt_id }) => {
                    commands::cmd_prompts_show(&mut library, prompt_id)
                }
                Some(PromptsAction::Path) => commands::cmd_prompts_path(),
            }
        }
        Commands::Check => {
            if !commands::cmd_check(&load_config()?).await? {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
