//! Factor scoring
//!
//! The reasoning service rates a purchase on five factors, each from -2 to +2:
//!
//! | Key | Factor | Positive when |
//! |-----|--------|---------------|
//! | D | Discretionary income | leftover income dwarfs the cost |
//! | O | Opportunity cost | no high-interest debt competes for the money |
//! | G | Goal alignment | the purchase supports the main goal |
//! | L | Long-term impact | benefits last, few ongoing costs |
//! | B | Behavioral | urgently needed, not impulsive |
//!
//! Whatever comes back is coerced and clamped rather than rejected. If nothing
//! usable comes back at all, every factor is 0.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::ai::{extract_json_object, GenerationParams, JsonObject, ReasoningBackend, ReasoningClient};
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink, Stage};
use crate::error::Result;
use crate::models::{FactorKind, FactorScore, FactorSet, FactorSource, FinancialContext, NO_EXPLANATION};
use crate::prompts::Prompt;

/// Asks the reasoning service for the five factor scores
#[derive(Clone)]
pub struct FactorScorer {
    client: ReasoningClient,
    prompt: Prompt,
    params: GenerationParams,
}

impl FactorScorer {
    pub fn new(client: ReasoningClient, prompt: Prompt, params: GenerationParams) -> Self {
        Self {
            client,
            prompt,
            params,
        }
    }

    /// Render the scoring prompt for one item and context
    pub fn build_prompt(&self, context: &FinancialContext, item_name: &str, item_cost: f64) -> String {
        let cost = format!("{:.2}", item_cost);
        let income = format!("{:.2}", context.leftover_income);
        let extra = context.extra_context.as_deref().unwrap_or("");

        let mut vars = HashMap::new();
        vars.insert("item_name", item_name);
        vars.insert("item_cost", cost.as_str());
        vars.insert("leftover_income", income.as_str());
        vars.insert("has_high_interest_debt", context.has_high_interest_debt.as_str());
        vars.insert("main_financial_goal", context.main_financial_goal.as_str());
        vars.insert("purchase_urgency", context.purchase_urgency.as_str());
        vars.insert("extra_context", extra);
        self.prompt.render_user(&vars)
    }

    /// Score a purchase, falling back to all zeros on any failure
    pub async fn score(
        &self,
        context: &FinancialContext,
        item_name: &str,
        item_cost: f64,
        sink: &dyn DiagnosticSink,
    ) -> FactorSet {
        self.score_traced(context, item_name, item_cost, sink)
            .await
            .0
    }

    /// Same as [`score`](Self::score), also reporting whether the fallback was used
    pub async fn score_traced(
        &self,
        context: &FinancialContext,
        item_name: &str,
        item_cost: f64,
        sink: &dyn DiagnosticSink,
    ) -> (FactorSet, FactorSource) {
        match self.try_score(context, item_name, item_cost).await {
            Ok(factors) => (factors, FactorSource::Scored),
            Err(e) => {
                sink.report(&DiagnosticEvent::new(
                    e.diagnostic_kind(),
                    Stage::FactorScoring,
                    format!("Could not score factors: {}", e),
                ));
                (FactorSet::neutral(), FactorSource::Fallback)
            }
        }
    }

    /// One call to the service, no fallback
    pub async fn try_score(
        &self,
        context: &FinancialContext,
        item_name: &str,
        item_cost: f64,
    ) -> Result<FactorSet> {
        let prompt = self.build_prompt(context, item_name, item_cost);
        debug!(chars = prompt.len(), "Requesting factor scores");

        let text = self.client.generate(&prompt, &self.params).await?;
        let object = extract_json_object(&text, &FactorKind::keys())?;
        Ok(interpret_factors(&object))
    }
}

/// Coerce and clamp the five factors of a decoded object
///
/// Missing or unreadable factor values count as 0. Explanations pass through
/// unchanged and default to "No explanation provided".
pub fn interpret_factors(object: &JsonObject) -> FactorSet {
    let scores = FactorKind::ALL.map(|kind| {
        let value = object.get(kind.key()).and_then(coerce_factor).unwrap_or(0);
        let explanation = match object.get(kind.explanation_key()) {
            None | Some(Value::Null) => NO_EXPLANATION.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        FactorScore::new(value, Some(explanation))
    });
    FactorSet::from_scores(scores)
}

/// Integer, float (rounded) or numeric string; anything else is unreadable
fn coerce_factor(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            let s = s.strip_prefix('+').unwrap_or(s);
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i64))
        }
        _ => None,
    }
}
