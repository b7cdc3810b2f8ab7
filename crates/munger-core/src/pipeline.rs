//! The decision pipeline
//!
//! Composes context inference, factor scoring, aggregation and the
//! recommendation mapping into one call. At most two sequential calls reach
//! the reasoning service per evaluation; each stage fails over to its own
//! deterministic fallback, so an evaluation of a valid request always
//! produces a decision.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::ai::{GenerationParams, ReasoningBackend, ReasoningClient};
use crate::config::ReasoningConfig;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::Result;
use crate::inference::ContextInferencer;
use crate::insights::{generate_insights, Insight};
use crate::models::{
    ContextSource, Decision, FactorSet, FactorSource, FinancialContext, PurchaseRequest,
};
use crate::prompts::{PromptLibrary, PromptSet};
use crate::scoring::FactorScorer;

/// Everything known about one evaluation
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub request: PurchaseRequest,
    pub context: FinancialContext,
    pub context_source: ContextSource,
    pub factors: FactorSet,
    pub factor_source: FactorSource,
    pub decision: Decision,
    pub insights: Vec<Insight>,
    /// Model that was asked (even if it failed)
    pub model: String,
    pub evaluated_at: DateTime<Utc>,
}

impl Assessment {
    /// Display label of the recommendation
    pub fn label(&self) -> &'static str {
        self.decision.category().label()
    }

    /// Whether any stage substituted its fallback
    pub fn used_fallback(&self) -> bool {
        self.context_source == ContextSource::Fallback
            || self.factor_source == FactorSource::Fallback
    }
}

/// Purchase decision pipeline
#[derive(Clone)]
pub struct DecisionPipeline {
    client: ReasoningClient,
    inferencer: ContextInferencer,
    scorer: FactorScorer,
    sink: Arc<dyn DiagnosticSink>,
}

impl DecisionPipeline {
    pub fn new(
        client: ReasoningClient,
        prompts: PromptSet,
        params: GenerationParams,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            inferencer: ContextInferencer::new(client.clone(), prompts.infer_context, params),
            scorer: FactorScorer::new(client.clone(), prompts.score_factors, params),
            client,
            sink,
        }
    }

    /// Embedded prompts, default generation parameters, fallbacks logged via tracing
    pub fn with_defaults(client: ReasoningClient) -> Result<Self> {
        Ok(Self::new(
            client,
            PromptSet::embedded()?,
            GenerationParams::default(),
            Arc::new(TracingSink),
        ))
    }

    /// Build the client from configuration and load prompts (overrides honored)
    pub fn from_config(config: &ReasoningConfig, sink: Arc<dyn DiagnosticSink>) -> Result<Self> {
        let client = ReasoningClient::from_config(config)?;
        let prompts = PromptSet::load(&mut PromptLibrary::new())?;
        Ok(Self::new(client, prompts, config.generation_params(), sink))
    }

    /// Evaluate a purchase and return its decision
    ///
    /// The only error is `InvalidData` for an empty item name or a cost that
    /// is not a positive number. Service and parse failures never surface
    /// here; they are absorbed into fallbacks and reported to the sink.
    pub async fn evaluate(
        &self,
        item_name: &str,
        item_cost: f64,
        context: Option<FinancialContext>,
    ) -> Result<Decision> {
        let request = PurchaseRequest::new(item_name, item_cost)?;
        Ok(self.assess(&request, context).await.decision)
    }

    /// Evaluate a validated request and keep every intermediate result
    pub async fn assess(
        &self,
        request: &PurchaseRequest,
        context: Option<FinancialContext>,
    ) -> Assessment {
        let sink = self.sink.as_ref();
        let name = request.item_name();
        let cost = request.item_cost();

        let (context, context_source) = match context {
            Some(context) => {
                let context = context.normalized();
                let context = if context.extra_context.is_none() {
                    context.with_extra_context(request.extra_context())
                } else {
                    context
                };
                (context, ContextSource::Supplied)
            }
            None => {
                let (context, source) = self.inferencer.infer_traced(name, cost, sink).await;
                (context.with_extra_context(request.extra_context()), source)
            }
        };

        let (factors, factor_source) = self.scorer.score_traced(&context, name, cost, sink).await;
        let decision = Decision::from_factors(&factors);
        let insights = generate_insights(name, &factors, &decision);

        info!(
            item = name,
            cost,
            pds = decision.pds(),
            category = %decision.category(),
            context = ?context_source,
            factors = ?factor_source,
            "Evaluation complete"
        );

        Assessment {
            request: request.clone(),
            context,
            context_source,
            factors,
            factor_source,
            decision,
            insights,
            model: self.client.model().to_string(),
            evaluated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockBackend, MockReply};
    use crate::diagnostics::CollectingSink;
    use crate::error::Error;
    use crate::models::{DebtStatus, Recommendation, Urgency};

    fn pipeline(mock: MockBackend, sink: Arc<CollectingSink>) -> DecisionPipeline {
        DecisionPipeline::new(
            ReasoningClient::Mock(mock),
            PromptSet::embedded().unwrap(),
            GenerationParams::default(),
            sink,
        )
    }

    #[tokio::test]
    async fn test_evaluate_rejects_bad_requests() {
        let mock = MockBackend::new();
        let sink = Arc::new(CollectingSink::new());
        let p = pipeline(mock.clone(), sink.clone());

        assert!(matches!(
            p.evaluate("  ", 10.0, None).await,
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            p.evaluate("Desk", 0.0, None).await,
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            p.evaluate("Desk", f64::NAN, None).await,
            Err(Error::InvalidData(_))
        ));
        assert_eq!(mock.call_count(), 0);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_supplied_context_skips_inference() {
        let mock = MockBackend::new();
        let sink = Arc::new(CollectingSink::new());
        let context = FinancialContext::new(
            5000.0,
            DebtStatus::No,
            "Save for retirement",
            Urgency::UrgentNeeds,
        );

        let decision = pipeline(mock.clone(), sink.clone())
            .evaluate("Quality Mattress", 800.0, Some(context))
            .await
            .unwrap();

        // Canned factors are 1, 1, 0, 1, 0
        assert_eq!(decision.pds(), 3);
        assert_eq!(decision.category(), Recommendation::Consider);
        assert_eq!(mock.call_count(), 1);
        assert!(mock.prompts()[0].contains("D_explanation"));
    }

    #[tokio::test]
    async fn test_supplied_context_income_is_clamped() {
        let mock = MockBackend::new();
        let sink = Arc::new(CollectingSink::new());
        let request = PurchaseRequest::new("Road Bike", 1200.0).unwrap();
        let context = FinancialContext {
            leftover_income: -250.0,
            has_high_interest_debt: DebtStatus::Yes,
            main_financial_goal: "Pay off cards".into(),
            purchase_urgency: Urgency::MostlyWants,
            extra_context: None,
        };

        let assessment = pipeline(mock.clone(), sink)
            .assess(&request, Some(context))
            .await;

        assert_eq!(assessment.context_source, ContextSource::Supplied);
        assert_eq!(assessment.context.leftover_income, 0.0);
        assert!(mock.prompts()[0].contains("Monthly Leftover Income: 0.00 USD"));
    }

    #[tokio::test]
    async fn test_fallback_income_for_huge_cost() {
        let sink = Arc::new(CollectingSink::new());
        let request = PurchaseRequest::new("Island", 1e308).unwrap();

        let assessment = pipeline(MockBackend::unavailable(), sink.clone())
            .assess(&request, None)
            .await;

        assert_eq!(assessment.context_source, ContextSource::Fallback);
        assert_eq!(assessment.context.leftover_income, f64::MAX);
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn test_inference_runs_before_scoring() {
        let mock = MockBackend::new();
        let sink = Arc::new(CollectingSink::new());
        let request = PurchaseRequest::new("Standing Desk", 450.0)
            .unwrap()
            .with_extra_context("Back pain from current chair");

        let assessment = pipeline(mock.clone(), sink.clone())
            .assess(&request, None)
            .await;

        assert_eq!(assessment.context_source, ContextSource::Inferred);
        assert_eq!(assessment.factor_source, FactorSource::Scored);
        assert_eq!(assessment.context.leftover_income, 2500.0);
        assert_eq!(
            assessment.context.extra_context.as_deref(),
            Some("Back pain from current chair")
        );
        assert_eq!(assessment.model, "mock");
        assert!(!assessment.used_fallback());

        let prompts = mock.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("purchase_urgency"));
        assert!(prompts[1].contains("Monthly Leftover Income: 2500.00 USD"));
        assert!(prompts[1].contains("Additional Context: Back pain from current chair"));
    }

    #[tokio::test]
    async fn test_each_stage_fails_over_independently() {
        let mock = MockBackend::scripted([MockReply::unavailable()]);
        let sink = Arc::new(CollectingSink::new());
        let request = PurchaseRequest::new("Quality Mattress", 800.0).unwrap();

        let assessment = pipeline(mock, sink.clone()).assess(&request, None).await;

        assert_eq!(assessment.context_source, ContextSource::Fallback);
        assert_eq!(assessment.context.leftover_income, 1600.0);
        assert_eq!(assessment.factor_source, FactorSource::Scored);
        assert_eq!(assessment.decision.pds(), 3);
        assert!(assessment.used_fallback());
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_assessment_serializes() {
        let sink = Arc::new(CollectingSink::new());
        let request = PurchaseRequest::new("Quality Mattress", 800.0).unwrap();
        let assessment = pipeline(MockBackend::new(), sink).assess(&request, None).await;

        let json = serde_json::to_value(&assessment).unwrap();
        assert_eq!(json["request"]["item_name"], "Quality Mattress");
        assert_eq!(json["context"]["purchase_urgency"], "Mixed");
        assert_eq!(json["factors"]["D"], 1);
        assert_eq!(json["decision"]["category"], "consider");
        assert_eq!(json["context_source"], "inferred");
        assert!(json["insights"].as_array().unwrap().len() >= 2);
    }
}
