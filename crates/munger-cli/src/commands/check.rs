//! Backend check command implementation

use anyhow::{Context, Result};
use munger_core::{BackendKind, ReasoningBackend, ReasoningClient, ReasoningConfig};

/// Show the configured backend and check that it answers
///
/// Returns whether the backend is healthy so callers can set an exit code.
pub async fn cmd_check(config: &ReasoningConfig) -> Result<bool> {
    println!("🔍 Checking reasoning backend...\n");

    let client =
        ReasoningClient::from_config(config).context("Failed to set up the reasoning backend")?;
    let info = client.info();

    println!("  Backend: {}", info.backend);
    println!("  Model:   {}", info.model);
    println!("  Host:    {}", info.host);
    if let Some(timeout) = config.timeout() {
        println!("  Timeout: {}s", timeout.as_secs());
    }
    println!(
        "  Sampling: temperature {}, max {} tokens\n",
        config.temperature, config.max_output_tokens
    );

    print!("Checking availability... ");
    if client.health_check().await {
        println!("✅ Connected");
        return Ok(true);
    }

    println!("❌ Failed");
    println!();
    match config.backend {
        BackendKind::Gemini => {
            println!("Check that MUNGER_API_KEY (or GOOGLE_API_KEY) holds a valid key");
            println!("and that model '{}' exists.", info.model);
        }
        BackendKind::Ollama => {
            println!("To set up Ollama:");
            println!("  1. Install Ollama: https://ollama.ai/download");
            println!("  2. Start the server: ollama serve");
            println!("  3. Pull the model: ollama pull {}", info.model);
            println!("  4. Point munger at it: export MUNGER_HOST={}", info.host);
        }
        BackendKind::OpenaiCompatible => {
            println!("Could not reach an OpenAI-compatible server at {}", info.host);
        }
        BackendKind::Mock => {}
    }
    println!("\nEvaluations still run, falling back to neutral defaults.");

    Ok(false)
}
