//! Evaluate command implementation

use anyhow::{Context, Result};
use munger_core::{
    Assessment, ContextSource, DecisionPipeline, FactorSource, FinancialContext, PurchaseRequest,
    Tone,
};

use super::format_money;

/// Evaluate one purchase and print the result
pub async fn cmd_evaluate(
    pipeline: &DecisionPipeline,
    item: &str,
    cost: f64,
    context: Option<FinancialContext>,
    extra: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut request = PurchaseRequest::new(item, cost).context("Invalid purchase")?;
    if let Some(extra) = extra {
        request = request.with_extra_context(extra);
    }

    if !json {
        println!("🤔 Evaluating {} ({})...\n", request.item_name(), format_money(cost));
    }

    let assessment = pipeline.assess(&request, context).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    } else {
        print!("{}", render_assessment(&assessment));
    }
    Ok(())
}

fn tone_marker(tone: Tone) -> &'static str {
    match tone {
        Tone::Positive => "✅",
        Tone::Negative => "⚠️ ",
        Tone::Neutral => "⚖️ ",
    }
}

/// Human-readable report for one assessment
pub fn render_assessment(assessment: &Assessment) -> String {
    let mut out = String::new();
    let decision = &assessment.decision;
    let context = &assessment.context;

    out.push_str(&format!(
        "{} {}  (PDS {:+})\n\n",
        tone_marker(decision.category().tone()),
        assessment.label(),
        decision.pds()
    ));

    let source = match assessment.context_source {
        ContextSource::Supplied => "supplied",
        ContextSource::Inferred => "inferred",
        ContextSource::Fallback => "default, inference failed",
    };
    out.push_str(&format!("Financial context ({}):\n", source));
    out.push_str(&format!(
        "  Leftover income:    {}/month\n",
        format_money(context.leftover_income)
    ));
    out.push_str(&format!(
        "  High-interest debt: {}\n",
        context.has_high_interest_debt
    ));
    out.push_str(&format!(
        "  Main goal:          {}\n",
        context.main_financial_goal
    ));
    out.push_str(&format!("  Urgency:            {}\n", context.purchase_urgency));
    if let Some(ref extra) = context.extra_context {
        out.push_str(&format!("  Notes:              {}\n", extra));
    }

    out.push_str("\nFactors");
    if assessment.factor_source == FactorSource::Fallback {
        out.push_str(" (scoring failed, all neutral)");
    }
    out.push_str(":\n");
    for (kind, score) in assessment.factors.iter() {
        out.push_str(&format!(
            "  {} {:<22} {:+}",
            kind.key(),
            kind.name(),
            score.value()
        ));
        if let Some(explanation) = score.explanation() {
            out.push_str(&format!("  {}", explanation));
        }
        out.push('\n');
    }

    out.push_str("\nInsights:\n");
    for insight in &assessment.insights {
        out.push_str(&format!(
            "  {} {}\n",
            tone_marker(insight.tone),
            insight.message
        ));
    }

    out
}
