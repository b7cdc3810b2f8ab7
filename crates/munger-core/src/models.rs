//! Domain models for Munger
//!
//! Everything here is plain data: a purchase request, the financial context it
//! is judged against, the five factor scores, and the decision derived from
//! them. None of these values outlive a single evaluation.

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Minimum monthly leftover income assumed when inference fails
pub const MIN_FALLBACK_INCOME: f64 = 1000.0;

/// Goal assumed when inference fails
pub const FALLBACK_GOAL: &str = "Save for emergencies";

/// Explanation used when the service scores a factor without explaining it
pub const NO_EXPLANATION: &str = "No explanation provided";

/// Lowest score a single factor can take
pub const FACTOR_MIN: i32 = -2;

/// Highest score a single factor can take
pub const FACTOR_MAX: i32 = 2;

/// PDS at or above which the recommendation is "Buy it."
pub const BUY_THRESHOLD: i32 = 5;

/// A purchase the user is thinking about
///
/// Deserialization runs the same validation as [`PurchaseRequest::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PurchaseRequestFields")]
pub struct PurchaseRequest {
    item_name: String,
    item_cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    extra_context: Option<String>,
}

impl PurchaseRequest {
    /// Validate and build a request
    ///
    /// The name must contain something other than whitespace and the cost must
    /// be a finite number greater than zero.
    pub fn new(item_name: impl Into<String>, item_cost: f64) -> Result<Self> {
        let item_name = item_name.into().trim().to_string();
        if item_name.is_empty() {
            return Err(Error::InvalidData("Item name must not be empty".into()));
        }
        if !item_cost.is_finite() || item_cost <= 0.0 {
            return Err(Error::InvalidData(format!(
                "Item cost must be a positive number, got {}",
                item_cost
            )));
        }
        Ok(Self {
            item_name,
            item_cost,
            extra_context: None,
        })
    }

    /// Attach free-text notes from the user (blank notes are ignored)
    pub fn with_extra_context(mut self, extra: impl Into<String>) -> Self {
        self.extra_context = non_blank(extra.into());
        self
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn item_cost(&self) -> f64 {
        self.item_cost
    }

    pub fn extra_context(&self) -> Option<&str> {
        self.extra_context.as_deref()
    }
}

#[derive(Deserialize)]
struct PurchaseRequestFields {
    item_name: String,
    item_cost: f64,
    #[serde(default)]
    extra_context: Option<String>,
}

impl TryFrom<PurchaseRequestFields> for PurchaseRequest {
    type Error = Error;

    fn try_from(fields: PurchaseRequestFields) -> Result<Self> {
        let request = Self::new(fields.item_name, fields.item_cost)?;
        Ok(match fields.extra_context {
            Some(extra) => request.with_extra_context(extra),
            None => request,
        })
    }
}

/// Whether the buyer carries high-interest debt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebtStatus {
    Yes,
    No,
}

impl DebtStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

impl std::str::FromStr for DebtStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "y" | "true" => Ok(Self::Yes),
            "no" | "n" | "false" => Ok(Self::No),
            _ => Err(format!("Unknown debt status: {}", s)),
        }
    }
}

impl std::fmt::Display for DebtStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How urgently the purchase is needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    #[serde(rename = "Urgent Needs")]
    UrgentNeeds,
    #[serde(rename = "Mostly Wants")]
    MostlyWants,
    Mixed,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UrgentNeeds => "Urgent Needs",
            Self::MostlyWants => "Mostly Wants",
            Self::Mixed => "Mixed",
        }
    }
}

impl std::str::FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let squashed: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        match squashed.as_str() {
            "urgentneeds" | "urgentneed" | "urgent" => Ok(Self::UrgentNeeds),
            "mostlywants" | "mostlywant" | "wants" => Ok(Self::MostlyWants),
            "mixed" => Ok(Self::Mixed),
            _ => Err(format!("Unknown purchase urgency: {}", s)),
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Financial situation a purchase is judged against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialContext {
    /// Monthly income left over after expenses (never negative)
    #[serde(deserialize_with = "deserialize_income")]
    pub leftover_income: f64,
    pub has_high_interest_debt: DebtStatus,
    pub main_financial_goal: String,
    pub purchase_urgency: Urgency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_context: Option<String>,
}

impl FinancialContext {
    /// Build a context, clamping negative or non-finite income to zero
    pub fn new(
        leftover_income: f64,
        has_high_interest_debt: DebtStatus,
        main_financial_goal: impl Into<String>,
        purchase_urgency: Urgency,
    ) -> Self {
        Self {
            leftover_income: clamp_income(leftover_income),
            has_high_interest_debt,
            main_financial_goal: main_financial_goal.into(),
            purchase_urgency,
            extra_context: None,
        }
    }

    /// Deterministic context used when inference is unavailable
    pub fn fallback(item_cost: f64) -> Self {
        Self::new(
            fallback_income(item_cost),
            DebtStatus::No,
            FALLBACK_GOAL,
            Urgency::Mixed,
        )
    }

    /// Re-apply the income clamp and drop blank notes
    ///
    /// The fields are public, so a context built by hand can hold a negative
    /// income; the pipeline normalizes supplied contexts before using them.
    pub fn normalized(mut self) -> Self {
        self.leftover_income = clamp_income(self.leftover_income);
        self.extra_context = self.extra_context.and_then(non_blank);
        self
    }

    /// Attach free-text notes (blank notes clear the field)
    pub fn with_extra_context(mut self, extra: Option<&str>) -> Self {
        self.extra_context = extra.and_then(|e| non_blank(e.to_string()));
        self
    }
}

/// `max(1000, item_cost * 2)`, saturating at `f64::MAX`
pub fn fallback_income(item_cost: f64) -> f64 {
    MIN_FALLBACK_INCOME.max(item_cost * 2.0).min(f64::MAX)
}

/// Negative and NaN become zero, positive overflow saturates
fn clamp_income(value: f64) -> f64 {
    if value.is_nan() || value <= 0.0 {
        0.0
    } else {
        value.min(f64::MAX)
    }
}

fn deserialize_income<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_income)
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// The five judgment factors, in canonical D, O, G, L, B order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactorKind {
    DiscretionaryIncome,
    OpportunityCost,
    GoalAlignment,
    LongTermImpact,
    Behavioral,
}

impl FactorKind {
    pub const ALL: [FactorKind; 5] = [
        Self::DiscretionaryIncome,
        Self::OpportunityCost,
        Self::GoalAlignment,
        Self::LongTermImpact,
        Self::Behavioral,
    ];

    /// Single-letter key used on the wire
    pub fn key(&self) -> &'static str {
        match self {
            Self::DiscretionaryIncome => "D",
            Self::OpportunityCost => "O",
            Self::GoalAlignment => "G",
            Self::LongTermImpact => "L",
            Self::Behavioral => "B",
        }
    }

    /// Key of the accompanying explanation string
    pub fn explanation_key(&self) -> &'static str {
        match self {
            Self::DiscretionaryIncome => "D_explanation",
            Self::OpportunityCost => "O_explanation",
            Self::GoalAlignment => "G_explanation",
            Self::LongTermImpact => "L_explanation",
            Self::Behavioral => "B_explanation",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DiscretionaryIncome => "Discretionary Income",
            Self::OpportunityCost => "Opportunity Cost",
            Self::GoalAlignment => "Goal Alignment",
            Self::LongTermImpact => "Long-Term Impact",
            Self::Behavioral => "Behavioral",
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::DiscretionaryIncome => 0,
            Self::OpportunityCost => 1,
            Self::GoalAlignment => 2,
            Self::LongTermImpact => 3,
            Self::Behavioral => 4,
        }
    }

    /// All wire keys (`D`, `O`, `G`, `L`, `B`)
    pub fn keys() -> [&'static str; 5] {
        Self::ALL.map(|k| k.key())
    }
}

/// One factor's score, always within `[FACTOR_MIN, FACTOR_MAX]`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "FactorScoreFields")]
pub struct FactorScore {
    value: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
}

impl FactorScore {
    /// Build a score, clamping out-of-range values instead of rejecting them
    pub fn new(value: i64, explanation: Option<String>) -> Self {
        Self {
            value: value.clamp(FACTOR_MIN as i64, FACTOR_MAX as i64) as i32,
            explanation,
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }
}

#[derive(Deserialize)]
struct FactorScoreFields {
    value: i64,
    #[serde(default)]
    explanation: Option<String>,
}

impl From<FactorScoreFields> for FactorScore {
    fn from(fields: FactorScoreFields) -> Self {
        Self::new(fields.value, fields.explanation)
    }
}

/// Scores for all five factors
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "FlatFactors")]
pub struct FactorSet {
    scores: [FactorScore; 5],
}

impl FactorSet {
    /// Scores in D, O, G, L, B order
    pub fn from_scores(scores: [FactorScore; 5]) -> Self {
        Self { scores }
    }

    /// Bare values in D, O, G, L, B order, no explanations
    pub fn from_values(values: [i64; 5]) -> Self {
        Self {
            scores: values.map(|v| FactorScore::new(v, None)),
        }
    }

    /// All zeros, no explanations
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: FactorKind) -> &FactorScore {
        &self.scores[kind.index()]
    }

    pub fn value(&self, kind: FactorKind) -> i32 {
        self.get(kind).value()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FactorKind, &FactorScore)> {
        FactorKind::ALL.iter().map(move |&k| (k, self.get(k)))
    }

    pub fn has_explanations(&self) -> bool {
        self.scores.iter().any(|s| s.explanation.is_some())
    }
}

/// Serializes in the same flat shape the service is asked to return:
/// `{"D": 1, ..., "D_explanation": "..."}`
impl Serialize for FactorSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (kind, score) in self.iter() {
            map.serialize_entry(kind.key(), &score.value)?;
        }
        for (kind, score) in self.iter() {
            if let Some(ref explanation) = score.explanation {
                map.serialize_entry(kind.explanation_key(), explanation)?;
            }
        }
        map.end()
    }
}

/// Flat wire shape, values clamped on the way in
#[derive(Deserialize)]
struct FlatFactors {
    #[serde(rename = "D")]
    d: i64,
    #[serde(rename = "O")]
    o: i64,
    #[serde(rename = "G")]
    g: i64,
    #[serde(rename = "L")]
    l: i64,
    #[serde(rename = "B")]
    b: i64,
    #[serde(rename = "D_explanation", default)]
    d_explanation: Option<String>,
    #[serde(rename = "O_explanation", default)]
    o_explanation: Option<String>,
    #[serde(rename = "G_explanation", default)]
    g_explanation: Option<String>,
    #[serde(rename = "L_explanation", default)]
    l_explanation: Option<String>,
    #[serde(rename = "B_explanation", default)]
    b_explanation: Option<String>,
}

impl From<FlatFactors> for FactorSet {
    fn from(flat: FlatFactors) -> Self {
        Self::from_scores([
            FactorScore::new(flat.d, flat.d_explanation),
            FactorScore::new(flat.o, flat.o_explanation),
            FactorScore::new(flat.g, flat.g_explanation),
            FactorScore::new(flat.l, flat.l_explanation),
            FactorScore::new(flat.b, flat.b_explanation),
        ])
    }
}

/// Sum of the five factors, always within `[-10, 10]`
pub fn compute_pds(factors: &FactorSet) -> i32 {
    factors.iter().map(|(_, s)| s.value()).sum()
}

/// Presentation tone attached to recommendations and insights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

/// Final recommendation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Buy,
    DontBuy,
    Consider,
}

impl Recommendation {
    /// Map a PDS to a category (`>= 5` buy, `< 0` don't buy, otherwise consider)
    pub fn from_pds(pds: i32) -> Self {
        if pds >= BUY_THRESHOLD {
            Self::Buy
        } else if pds < 0 {
            Self::DontBuy
        } else {
            Self::Consider
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Buy => "Buy it.",
            Self::DontBuy => "Don't buy it.",
            Self::Consider => "Consider carefully.",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Self::Buy => Tone::Positive,
            Self::DontBuy => Tone::Negative,
            Self::Consider => Tone::Neutral,
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Category plus its display label
pub fn recommend(pds: i32) -> (Recommendation, &'static str) {
    let category = Recommendation::from_pds(pds);
    (category, category.label())
}

/// Score and category for one evaluation
///
/// Deserialization rejects a PDS outside `[-10, 10]` or a category that does
/// not match it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DecisionFields")]
pub struct Decision {
    pds: i32,
    category: Recommendation,
}

impl Decision {
    pub fn from_factors(factors: &FactorSet) -> Self {
        let pds = compute_pds(factors);
        Self {
            pds,
            category: Recommendation::from_pds(pds),
        }
    }

    pub fn pds(&self) -> i32 {
        self.pds
    }

    pub fn category(&self) -> Recommendation {
        self.category
    }
}

#[derive(Deserialize)]
struct DecisionFields {
    pds: i32,
    category: Recommendation,
}

impl TryFrom<DecisionFields> for Decision {
    type Error = Error;

    fn try_from(fields: DecisionFields) -> Result<Self> {
        let bound = FACTOR_MAX * FactorKind::ALL.len() as i32;
        if !(-bound..=bound).contains(&fields.pds) {
            return Err(Error::InvalidData(format!(
                "PDS must be within [-{bound}, {bound}], got {}",
                fields.pds
            )));
        }
        let expected = Recommendation::from_pds(fields.pds);
        if fields.category != expected {
            return Err(Error::InvalidData(format!(
                "Category {:?} does not match PDS {}",
                fields.category, fields.pds
            )));
        }
        Ok(Self {
            pds: fields.pds,
            category: fields.category,
        })
    }
}

/// Where the financial context of an assessment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSource {
    /// Provided by the caller
    Supplied,
    /// Inferred by the reasoning service
    Inferred,
    /// Deterministic default after inference failed
    Fallback,
}

/// Where the factor scores of an assessment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorSource {
    Scored,
    Fallback,
}
