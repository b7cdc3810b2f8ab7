//! Prompts-related command implementations

use anyhow::Result;
use munger_core::prompts::{default_prompts_dir, PromptId, PromptLibrary};

/// List all available prompts and their override status
pub fn cmd_prompts_list(library: &mut PromptLibrary) -> Result<()> {
    let prompts = library.list();

    println!("Available Prompts:\n");

    println!(
        "{:<16} {:>7}  {:<10}  {}",
        "ID", "VERSION", "OVERRIDE", "DESCRIPTION"
    );
    println!("{}", "-".repeat(80));

    for info in prompts {
        let override_status = if info.has_override {
            "✓ Custom"
        } else {
            "Default"
        };

        println!(
            "{:<16} {:>7}  {:<10}  {}",
            info.id, info.version, override_status, info.description
        );
    }

    println!();
    println!(
        "Override directory: {}",
        library
            .override_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not available)".to_string())
    );

    println!();
    println!("To customize a prompt:");
    println!("  1. Copy the default (munger prompts show <id>) to <override dir>/<id>.md");
    println!("  2. Edit the file, keeping the frontmatter id");
    println!("  3. The next evaluation picks it up");

    Ok(())
}

/// Show the content of a specific prompt
pub fn cmd_prompts_show(library: &mut PromptLibrary, prompt_id: &str) -> Result<()> {
    let id: PromptId = match prompt_id.parse() {
        Ok(id) => id,
        Err(_) => {
            eprintln!("Unknown prompt ID: {}", prompt_id);
            eprintln!();
            eprintln!("Available prompts:");
            for id in PromptId::all() {
                eprintln!("  - {}", id.as_str());
            }
            return Ok(());
        }
    };

    let prompt = library.get(id)?;

    println!("---");
    println!("id: {}", prompt.metadata.id);
    println!("version: {}", prompt.metadata.version);
    if !prompt.metadata.description.is_empty() {
        println!("description: {}", prompt.metadata.description);
    }
    println!("---");
    if let Some(ref path) = prompt.override_path {
        eprintln!("(override: {})", path.display());
    }
    println!();
    println!("{}", prompt.content);

    Ok(())
}

/// Show the path where prompt overrides should be placed
pub fn cmd_prompts_path() -> Result<()> {
    match default_prompts_dir() {
        Some(path) => {
            println!("{}", path.display());

            if !path.exists() {
                eprintln!();
                eprintln!("Note: This directory does not exist yet.");
                eprintln!("Create it to start adding custom prompts.");
            }
        }
        None => {
            eprintln!("Could not determine prompts directory.");
            eprintln!("The data directory is not available on this system.");
        }
    }

    Ok(())
}
