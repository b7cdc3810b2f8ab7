//! Advisory insights for a finished evaluation
//!
//! A headline for the category, one line per factor that scored at either
//! extreme, and a closing suggestion. Pure text generation; nothing here
//! talks to the reasoning service.

use serde::{Deserialize, Serialize};

use crate::models::{Decision, FactorKind, FactorSet, Recommendation, Tone, NO_EXPLANATION};

/// A single advisory line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub tone: Tone,
    pub message: String,
}

impl Insight {
    fn new(tone: Tone, message: impl Into<String>) -> Self {
        Self {
            tone,
            message: message.into(),
        }
    }
}

/// Build the insight list for one decision
pub fn generate_insights(item_name: &str, factors: &FactorSet, decision: &Decision) -> Vec<Insight> {
    let mut insights = vec![headline(item_name, decision.category())];

    for (_, score) in factors.iter() {
        let explanation = score.explanation().filter(|e| *e != NO_EXPLANATION);
        if score.value() >= 2 {
            insights.push(Insight::new(
                Tone::Positive,
                explanation.unwrap_or("Strong positive for this factor."),
            ));
        } else if score.value() <= -2 {
            insights.push(Insight::new(
                Tone::Negative,
                explanation.unwrap_or("Strong negative for this factor."),
            ));
        }
    }

    insights.push(closing(factors, decision.category()));
    insights
}

fn headline(item_name: &str, category: Recommendation) -> Insight {
    let message = match category {
        Recommendation::Buy => format!(
            "Based on our analysis, buying the {} is a good financial decision.",
            item_name
        ),
        Recommendation::DontBuy => format!(
            "Our analysis suggests that buying the {} may not be the best financial decision right now.",
            item_name
        ),
        Recommendation::Consider => format!(
            "This purchase could be reasonable, but carefully consider if the {} is truly necessary.",
            item_name
        ),
    };
    Insight::new(category.tone(), message)
}

fn closing(factors: &FactorSet, category: Recommendation) -> Insight {
    let message = match category {
        Recommendation::Buy => "Go ahead with this purchase.",
        Recommendation::DontBuy => {
            if factors.value(FactorKind::DiscretionaryIncome) < 0 {
                "Consider saving more before making this purchase."
            } else if factors.value(FactorKind::OpportunityCost) < 0 {
                "Focus on paying down high-interest debt first."
            } else if factors.value(FactorKind::LongTermImpact) < 0 {
                "Look for alternatives with better long-term value."
            } else {
                "Consider waiting or finding less expensive alternatives."
            }
        }
        Recommendation::Consider => {
            "If you decide to proceed, make sure this purchase doesn't impact other financial priorities."
        }
    };
    Insight::new(category.tone(), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FactorScore;

    fn messages(insights: &[Insight]) -> Vec<&str> {
        insights.iter().map(|i| i.message.as_str()).collect()
    }

    #[test]
    fn test_buy_insights() {
        let factors = FactorSet::from_scores([
            FactorScore::new(2, Some("Cheap relative to income.".into())),
            FactorScore::new(2, None),
            FactorScore::new(2, Some(NO_EXPLANATION.into())),
            FactorScore::new(2, None),
            FactorScore::new(1, Some("Somewhat needed.".into())),
        ]);
        let decision = Decision::from_factors(&factors);
        let insights = generate_insights("Quality Mattress", &factors, &decision);

        assert_eq!(
            messages(&insights),
            vec![
                "Based on our analysis, buying the Quality Mattress is a good financial decision.",
                "Cheap relative to income.",
                "Strong positive for this factor.",
                "Strong positive for this factor.",
                "Strong positive for this factor.",
                "Go ahead with this purchase.",
            ]
        );
        assert!(insights.iter().all(|i| i.tone == Tone::Positive));
    }

    #[test]
    fn test_dont_buy_closing_priority() {
        let cases = [
            ([-1, -2, 0, -1, 0], "Consider saving more before making this purchase."),
            ([0, -2, 0, -1, 0], "Focus on paying down high-interest debt first."),
            ([0, 0, -1, -1, 0], "Look for alternatives with better long-term value."),
            ([0, 0, -1, 0, -1], "Consider waiting or finding less expensive alternatives."),
        ];
        for (values, expected) in cases {
            let factors = FactorSet::from_values(values);
            let decision = Decision::from_factors(&factors);
            assert_eq!(decision.category(), Recommendation::DontBuy);
            let insights = generate_insights("Designer Watch", &factors, &decision);
            assert_eq!(insights.last().unwrap().message, expected);
            assert!(insights[0].message.starts_with("Our analysis suggests"));
        }
    }

    #[test]
    fn test_dont_buy_strong_negative_line() {
        let factors = FactorSet::from_values([0, -2, 0, 0, 0]);
        let decision = Decision::from_factors(&factors);
        let insights = generate_insights("Designer Watch", &factors, &decision);
        assert_eq!(insights.len(), 3);
        assert_eq!(insights[1].message, "Strong negative for this factor.");
        assert_eq!(insights[1].tone, Tone::Negative);
    }

    #[test]
    fn test_consider_insights() {
        let factors = FactorSet::neutral();
        let decision = Decision::from_factors(&factors);
        let insights = generate_insights("Latest Smartphone", &factors, &decision);

        assert_eq!(
            messages(&insights),
            vec![
                "This purchase could be reasonable, but carefully consider if the Latest Smartphone is truly necessary.",
                "If you decide to proceed, make sure this purchase doesn't impact other financial priorities.",
            ]
        );
        assert!(insights.iter().all(|i| i.tone == Tone::Neutral));
    }
}
