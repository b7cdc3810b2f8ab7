//! Integration tests for munger-core
//!
//! These tests exercise the full request → inference → scoring → decision
//! workflow against a scripted reasoning backend.

use std::sync::Arc;

use munger_core::{
    compute_pds, recommend, sample_purchases, BackendKind, CollectingSink, ContextSource,
    DebtStatus, DecisionPipeline, DiagnosticKind, FactorSource, FinancialContext,
    GenerationParams, MockBackend, MockReply, NullSink, PromptSet, PurchaseRequest,
    ReasoningClient, ReasoningConfig, Recommendation, Stage, Tone, Urgency,
};

fn pipeline(mock: MockBackend) -> (DecisionPipeline, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let pipeline = DecisionPipeline::new(
        ReasoningClient::Mock(mock),
        PromptSet::embedded().expect("embedded prompts parse"),
        GenerationParams::default(),
        sink.clone(),
    );
    (pipeline, sink)
}

// =============================================================================
// Fallback Behavior
// =============================================================================

#[tokio::test]
async fn test_service_down_for_both_calls() {
    let mock = MockBackend::unavailable();
    let (pipeline, sink) = pipeline(mock.clone());

    let decision = pipeline
        .evaluate("Quality Mattress", 800.0, None)
        .await
        .unwrap();

    assert_eq!(decision.pds(), 0);
    assert_eq!(decision.category(), Recommendation::Consider);
    assert_eq!(mock.call_count(), 2);

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].stage, Stage::ContextInference);
    assert_eq!(events[1].stage, Stage::FactorScoring);
    assert!(events.iter().all(|e| e.kind == DiagnosticKind::Service));
}

#[tokio::test]
async fn test_null_sink_still_falls_back() {
    let mock = MockBackend::unavailable();
    let pipeline = DecisionPipeline::new(
        ReasoningClient::Mock(mock.clone()),
        PromptSet::embedded().expect("embedded prompts parse"),
        GenerationParams::default(),
        Arc::new(NullSink),
    );

    let decision = pipeline.evaluate("Quality Mattress", 800.0, None).await.unwrap();

    assert_eq!(decision.pds(), 0);
    assert_eq!(decision.category(), Recommendation::Consider);
    assert_eq!(mock.call_count(), 2);
}

#[tokio::test]
async fn test_fallback_income_property() {
    for cost in [0.01, 3.5, 499.99, 500.0, 501.0, 800.0, 5000.0, 123_456.78] {
        let (pipeline, _sink) = pipeline(MockBackend::unavailable());
        let request = PurchaseRequest::new("Anything", cost).unwrap();
        let assessment = pipeline.assess(&request, None).await;

        assert_eq!(assessment.context_source, ContextSource::Fallback);
        assert_eq!(assessment.context.leftover_income, f64::max(1000.0, cost * 2.0));
        assert_eq!(assessment.context.has_high_interest_debt, DebtStatus::No);
        assert_eq!(assessment.context.main_financial_goal, "Save for emergencies");
        assert_eq!(assessment.context.purchase_urgency, Urgency::Mixed);
    }

    // Doubling overflows here; income saturates instead of collapsing to zero
    let (pipeline, _sink) = pipeline(MockBackend::unavailable());
    let request = PurchaseRequest::new("Private Island", f64::MAX).unwrap();
    let assessment = pipeline.assess(&request, None).await;
    assert_eq!(assessment.context.leftover_income, f64::MAX);
}

#[tokio::test]
async fn test_non_json_scoring_reply_is_neutral() {
    let context = FinancialContext::new(3000.0, DebtStatus::No, "Travel", Urgency::Mixed);
    let mock = MockBackend::scripted([MockReply::text(
        "This looks like a reasonable purchase overall, I would rate it highly.",
    )]);
    let (pipeline, sink) = pipeline(mock);

    let request = PurchaseRequest::new("Weekend Trip", 600.0).unwrap();
    let assessment = pipeline.assess(&request, Some(context)).await;

    assert_eq!(assessment.factor_source, FactorSource::Fallback);
    assert!(assessment.factors.iter().all(|(_, s)| s.value() == 0));
    assert_eq!(compute_pds(&assessment.factors), 0);
    assert_eq!(assessment.decision.category(), Recommendation::Consider);

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, DiagnosticKind::Parse);
}

// =============================================================================
// Scored Evaluations
// =============================================================================

#[tokio::test]
async fn test_supplied_context_strong_buy() {
    let context = FinancialContext::new(
        5000.0,
        DebtStatus::No,
        "Save for retirement",
        Urgency::UrgentNeeds,
    );
    let mock = MockBackend::scripted([MockReply::text(
        r#"{"D": 2, "O": 2, "G": 2, "L": 2, "B": 1}"#,
    )]);
    let (pipeline, sink) = pipeline(mock.clone());

    let decision = pipeline
        .evaluate("Quality Mattress", 800.0, Some(context))
        .await
        .unwrap();

    assert_eq!(decision.pds(), 9);
    assert_eq!(decision.category(), Recommendation::Buy);
    assert_eq!(mock.call_count(), 1);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_inferred_context_strong_buy() {
    let mock = MockBackend::scripted([
        MockReply::text(
            r#"{"leftover_income": 5000, "has_high_interest_debt": "No",
"main_financial_goal": "Save for retirement", "purchase_urgency": "Urgent Needs"}"#,
        ),
        MockReply::text(r#"{"D": 2, "O": 2, "G": 2, "L": 2, "B": 1}"#),
    ]);
    let (pipeline, sink) = pipeline(mock.clone());
    let request = PurchaseRequest::new("Quality Mattress", 800.0).unwrap();

    let assessment = pipeline.assess(&request, None).await;

    assert_eq!(assessment.context_source, ContextSource::Inferred);
    assert_eq!(assessment.context.leftover_income, 5000.0);
    assert_eq!(assessment.context.has_high_interest_debt, DebtStatus::No);
    assert_eq!(assessment.context.main_financial_goal, "Save for retirement");
    assert_eq!(assessment.context.purchase_urgency, Urgency::UrgentNeeds);
    assert_eq!(assessment.factor_source, FactorSource::Scored);
    assert_eq!(assessment.decision.pds(), 9);
    assert_eq!(assessment.decision.category(), Recommendation::Buy);
    assert_eq!(mock.call_count(), 2);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_noisy_replies_with_out_of_range_scores() {
    let mock = MockBackend::scripted([
        MockReply::text(
            r#"Let me think. A typical buyer {maybe} earns well.
{"leftover_income": "1,800", "has_high_interest_debt": "Yes",
 "main_financial_goal": "Pay off credit card", "purchase_urgency": "Mostly Wants"}
Hope this helps!"#,
        ),
        MockReply::text(
            r#"Scores: {"D": -5, "O": -2, "G": -1, "L": 0, "B": -2,
 "O_explanation": "High-interest debt should come first.",
 "B_explanation": "This is an impulse purchase."} (done)"#,
        ),
    ]);
    let (pipeline, sink) = pipeline(mock);

    let request = PurchaseRequest::new("Designer Watch", 5000.0).unwrap();
    let assessment = pipeline.assess(&request, None).await;

    assert_eq!(assessment.context_source, ContextSource::Inferred);
    assert_eq!(assessment.context.leftover_income, 1800.0);
    assert_eq!(assessment.context.has_high_interest_debt, DebtStatus::Yes);

    assert_eq!(assessment.factor_source, FactorSource::Scored);
    assert_eq!(assessment.decision.pds(), -7);
    assert_eq!(assessment.decision.category(), Recommendation::DontBuy);
    assert!(sink.is_empty());

    let messages: Vec<&str> = assessment
        .insights
        .iter()
        .map(|i| i.message.as_str())
        .collect();
    assert_eq!(
        messages,
        vec![
            "Our analysis suggests that buying the Designer Watch may not be the best financial decision right now.",
            "Strong negative for this factor.",
            "High-interest debt should come first.",
            "This is an impulse purchase.",
            "Consider saving more before making this purchase.",
        ]
    );
    assert!(assessment.insights.iter().all(|i| i.tone == Tone::Negative));
}

#[tokio::test]
async fn test_factor_bounds_hold_for_any_reply() {
    let replies = [
        r#"{"D": 100, "O": -100, "G": 2.4, "L": "-9", "B": "x"}"#,
        r#"{"D": 3, "O": 3, "G": 3, "L": 3, "B": 3}"#,
        r#"{"D": -3, "O": -3, "G": -3, "L": -3, "B": -3}"#,
    ];
    for reply in replies {
        let context = FinancialContext::fallback(100.0);
        let (pipeline, _sink) = pipeline(MockBackend::scripted([MockReply::text(reply)]));
        let request = PurchaseRequest::new("Gadget", 100.0).unwrap();
        let assessment = pipeline.assess(&request, Some(context)).await;

        for (_, score) in assessment.factors.iter() {
            assert!((-2..=2).contains(&score.value()));
        }
        assert!((-10..=10).contains(&assessment.decision.pds()));
    }
}

// =============================================================================
// Recommendation Mapping
// =============================================================================

#[test]
fn test_recommend_boundaries() {
    assert_eq!(recommend(5), (Recommendation::Buy, "Buy it."));
    assert_eq!(recommend(4), (Recommendation::Consider, "Consider carefully."));
    assert_eq!(recommend(0), (Recommendation::Consider, "Consider carefully."));
    assert_eq!(recommend(-1), (Recommendation::DontBuy, "Don't buy it."));
}

// =============================================================================
// Samples and Configuration
// =============================================================================

#[tokio::test]
async fn test_samples_run_against_mock() {
    let (pipeline, sink) = pipeline(MockBackend::new());

    for sample in sample_purchases() {
        let request = sample.request().unwrap();
        let assessment = pipeline.assess(&request, None).await;
        assert_eq!(assessment.request.item_name(), sample.item);
        assert!(!assessment.used_fallback());
    }
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_mock_backend_from_config() {
    let config = ReasoningConfig::from_toml_str("backend = \"mock\"").unwrap();
    assert_eq!(config.backend, BackendKind::Mock);

    let client = ReasoningClient::from_config(&config).unwrap();
    let pipeline = DecisionPipeline::with_defaults(client).unwrap();
    let decision = pipeline
        .evaluate("Quality Mattress", 800.0, None)
        .await
        .unwrap();
    assert_eq!(decision.pds(), 3);
}
