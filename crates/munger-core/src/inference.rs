//! Financial context inference
//!
//! When the caller does not describe their finances, the reasoning service is
//! asked to guess a plausible context from nothing but the item name and
//! price. Any failure falls back to a deterministic context scaled to the
//! cost, so this stage never fails.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::ai::{extract_json_object, GenerationParams, JsonObject, ReasoningBackend, ReasoningClient};
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink, Stage};
use crate::error::Result;
use crate::models::{
    fallback_income, ContextSource, DebtStatus, FinancialContext, Urgency, FALLBACK_GOAL,
};
use crate::prompts::Prompt;

/// Keys the inferred object must carry
pub const CONTEXT_KEYS: [&str; 4] = [
    "leftover_income",
    "has_high_interest_debt",
    "main_financial_goal",
    "purchase_urgency",
];

/// Asks the reasoning service for a financial context
#[derive(Clone)]
pub struct ContextInferencer {
    client: ReasoningClient,
    prompt: Prompt,
    params: GenerationParams,
}

impl ContextInferencer {
    pub fn new(client: ReasoningClient, prompt: Prompt, params: GenerationParams) -> Self {
        Self {
            client,
            prompt,
            params,
        }
    }

    /// Render the inference prompt for one item
    pub fn build_prompt(&self, item_name: &str, item_cost: f64) -> String {
        let cost = format!("{:.2}", item_cost);
        let mut vars = HashMap::new();
        vars.insert("item_name", item_name);
        vars.insert("item_cost", cost.as_str());
        self.prompt.render_user(&vars)
    }

    /// Infer a context, falling back to the deterministic default on any failure
    pub async fn infer(
        &self,
        item_name: &str,
        item_cost: f64,
        sink: &dyn DiagnosticSink,
    ) -> FinancialContext {
        self.infer_traced(item_name, item_cost, sink).await.0
    }

    /// Same as [`infer`](Self::infer), also reporting whether the fallback was used
    pub async fn infer_traced(
        &self,
        item_name: &str,
        item_cost: f64,
        sink: &dyn DiagnosticSink,
    ) -> (FinancialContext, ContextSource) {
        match self.try_infer(item_name, item_cost).await {
            Ok(context) => (context, ContextSource::Inferred),
            Err(e) => {
                sink.report(&DiagnosticEvent::new(
                    e.diagnostic_kind(),
                    Stage::ContextInference,
                    format!("Could not infer financial context: {}", e),
                ));
                (FinancialContext::fallback(item_cost), ContextSource::Fallback)
            }
        }
    }

    /// One call to the service, no fallback
    pub async fn try_infer(&self, item_name: &str, item_cost: f64) -> Result<FinancialContext> {
        let prompt = self.build_prompt(item_name, item_cost);
        debug!(chars = prompt.len(), "Requesting context inference");

        let text = self.client.generate(&prompt, &self.params).await?;
        let object = extract_json_object(&text, &CONTEXT_KEYS)?;
        Ok(interpret_context(&object, item_cost))
    }
}

/// Turn a decoded object into a context, substituting defaults for unreadable fields
pub fn interpret_context(object: &JsonObject, item_cost: f64) -> FinancialContext {
    let leftover_income = match object.get("leftover_income").and_then(read_amount) {
        Some(amount) => amount,
        None => {
            warn!(
                value = ?object.get("leftover_income"),
                "Unreadable leftover_income, using fallback income"
            );
            fallback_income(item_cost)
        }
    };

    let debt = object.get("has_high_interest_debt");
    let has_high_interest_debt = match debt.and_then(read_debt) {
        Some(status) => status,
        None => {
            warn!(value = ?debt, "Unreadable has_high_interest_debt, assuming No");
            DebtStatus::No
        }
    };

    let main_financial_goal = match object.get("main_financial_goal") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        other => {
            warn!(value = ?other, "Missing main_financial_goal, using default");
            FALLBACK_GOAL.to_string()
        }
    };

    let purchase_urgency = match object
        .get("purchase_urgency")
        .and_then(Value::as_str)
        .map(str::parse::<Urgency>)
    {
        Some(Ok(urgency)) => urgency,
        _ => {
            warn!(
                value = ?object.get("purchase_urgency"),
                "Unreadable purchase_urgency, assuming Mixed"
            );
            Urgency::Mixed
        }
    };

    FinancialContext::new(
        leftover_income,
        has_high_interest_debt,
        main_financial_goal,
        purchase_urgency,
    )
}

fn read_debt(value: &Value) -> Option<DebtStatus> {
    match value {
        Value::Bool(true) => Some(DebtStatus::Yes),
        Value::Bool(false) => Some(DebtStatus::No),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// A JSON number, or a string like "$2,500"
fn read_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
                .collect();
            cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}
