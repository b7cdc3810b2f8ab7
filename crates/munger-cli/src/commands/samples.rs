//! Sample catalog command implementations

use anyhow::{bail, Result};
use munger_core::{find_sample, sample_purchases, DecisionPipeline, SamplePurchase};

use super::{format_money, render_assessment};

/// List the example purchases
pub fn cmd_samples_list() -> Result<()> {
    println!("Example Purchases:\n");
    println!(
        "{:<32} {:<26} {:>12}  {}",
        "TITLE", "ITEM", "COST", "LIKELY PDS"
    );
    println!("{}", "-".repeat(88));

    for sample in sample_purchases() {
        println!(
            "{:<32} {:<26} {:>12}  {}",
            sample.title,
            sample.item,
            format_money(sample.cost),
            sample.likely_score
        );
    }

    println!();
    println!("Try one with:");
    println!("  munger evaluate --item \"Quality Mattress\" --cost 800");
    println!("Or run them all with: munger samples --run");
    println!("Or just one: munger samples --run --item \"Designer Watch\"");

    Ok(())
}

/// Evaluate the example purchases in turn, or just the one named by `item`
pub async fn cmd_samples_run(pipeline: &DecisionPipeline, item: Option<&str>) -> Result<()> {
    let selected: Vec<&SamplePurchase> = match item {
        Some(item) => match find_sample(item) {
            Some(sample) => vec![sample],
            None => bail!(
                "No example purchase named '{}' (see: munger samples)",
                item
            ),
        },
        None => sample_purchases().iter().collect(),
    };

    for sample in selected {
        println!("━━━ {} ━━━", sample.title);
        println!(
            "{} ({}): {}",
            sample.item,
            format_money(sample.cost),
            sample.description
        );
        println!("Expected: {}\n", sample.likely_score);

        let request = sample.request()?;
        let assessment = pipeline.assess(&request, None).await;
        println!("{}", render_assessment(&assessment));
    }
    Ok(())
}
