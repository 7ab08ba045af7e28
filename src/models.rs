use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::AnalyticsError;

/// Review attributes tracked per month, in enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Taste,
    Price,
    Service,
    Ambience,
    Hygiene,
    Staff,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::Taste,
        Attribute::Price,
        Attribute::Service,
        Attribute::Ambience,
        Attribute::Hygiene,
        Attribute::Staff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Taste => "taste",
            Attribute::Price => "price",
            Attribute::Service => "service",
            Attribute::Ambience => "ambience",
            Attribute::Hygiene => "hygiene",
            Attribute::Staff => "staff",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Attribute::Taste => "Taste",
            Attribute::Price => "Price",
            Attribute::Service => "Service",
            Attribute::Ambience => "Ambience",
            Attribute::Hygiene => "Hygiene",
            Attribute::Staff => "Staff",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn sentiment_column(&self) -> String {
        format!("{}_weighted_sentiment", self.as_str())
    }

    pub fn mention_column(&self) -> String {
        format!("{}_mention", self.as_str())
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Attribute::ALL
            .into_iter()
            .find(|attribute| attribute.as_str() == normalized)
            .ok_or_else(|| AnalyticsError::UnknownAttribute(value.to_string()))
    }
}

/// Kano satisfaction categories. Declaration order is the importance scale,
/// so the derived `Ord` matches the ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum KanoCategory {
    Reverse,
    Indifferent,
    Attractive,
    #[serde(rename = "One-Dimensional")]
    OneDimensional,
    #[serde(rename = "Must-Be")]
    MustBe,
}

impl KanoCategory {
    pub const ORDER: [KanoCategory; 5] = [
        KanoCategory::Reverse,
        KanoCategory::Indifferent,
        KanoCategory::Attractive,
        KanoCategory::OneDimensional,
        KanoCategory::MustBe,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            KanoCategory::Reverse => "Reverse",
            KanoCategory::Indifferent => "Indifferent",
            KanoCategory::Attractive => "Attractive",
            KanoCategory::OneDimensional => "One-Dimensional",
            KanoCategory::MustBe => "Must-Be",
        }
    }

    pub fn ordinal(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for KanoCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for KanoCategory {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        KanoCategory::ORDER
            .into_iter()
            .find(|category| category.label() == trimmed)
            .ok_or_else(|| AnalyticsError::UnknownCategory(value.to_string()))
    }
}

/// A column of the monthly table that can be forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum ForecastTarget {
    AvgRating,
    WeightedSentiment(Attribute),
}

impl ForecastTarget {
    pub fn all() -> Vec<ForecastTarget> {
        std::iter::once(ForecastTarget::AvgRating)
            .chain(Attribute::ALL.into_iter().map(ForecastTarget::WeightedSentiment))
            .collect()
    }

    pub fn column_name(&self) -> String {
        match self {
            ForecastTarget::AvgRating => "avg_rating".to_string(),
            ForecastTarget::WeightedSentiment(attribute) => attribute.sentiment_column(),
        }
    }

    /// "taste_weighted_sentiment" -> "Taste Weighted Sentiment"
    pub fn title(&self) -> String {
        self.column_name()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn value(&self, record: &MonthlyAttributeRecord) -> f64 {
        match self {
            ForecastTarget::AvgRating => record.avg_rating,
            ForecastTarget::WeightedSentiment(attribute) => {
                record.signal(*attribute).weighted_sentiment
            }
        }
    }
}

impl fmt::Display for ForecastTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.column_name())
    }
}

impl From<ForecastTarget> for String {
    fn from(target: ForecastTarget) -> Self {
        target.column_name()
    }
}

impl FromStr for ForecastTarget {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        ForecastTarget::all()
            .into_iter()
            .find(|target| target.column_name() == normalized)
            .ok_or_else(|| AnalyticsError::UnknownTarget(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AttributeSignal {
    pub weighted_sentiment: f64,
    pub mention: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAttributeRecord {
    pub month: NaiveDate,
    pub avg_rating: f64,
    /// Indexed by `Attribute::index`.
    pub signals: [AttributeSignal; 6],
}

impl MonthlyAttributeRecord {
    pub fn signal(&self, attribute: Attribute) -> &AttributeSignal {
        &self.signals[attribute.index()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KanoRecord {
    pub attribute: Attribute,
    pub month: String,
    pub year: i32,
    pub category: KanoCategory,
    pub beta_plus: f64,
    pub beta_minus: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingPoint {
    pub month: NaiveDate,
    pub avg_rating: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingSummary {
    pub first: f64,
    pub last: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub months: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributePoint {
    pub month: NaiveDate,
    pub attribute: Attribute,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryStep {
    pub attribute: Attribute,
    pub month: String,
    pub category: KanoCategory,
    pub ordinal: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryComposition {
    pub month: String,
    /// Indexed by `KanoCategory::ordinal`.
    pub counts: [usize; 5],
}

#[derive(Debug, Clone, Serialize)]
pub struct ImpactSummary {
    pub attribute: Attribute,
    pub mean_beta_plus: f64,
    pub mean_beta_minus: f64,
    pub record_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BetaPoint {
    pub attribute: Attribute,
    pub month: String,
    pub beta_plus: f64,
    pub beta_minus: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwitchSummary {
    pub attribute: Attribute,
    pub switch_count: usize,
    pub first_category: KanoCategory,
    pub last_category: KanoCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTransition {
    pub attribute: Attribute,
    pub first_category: KanoCategory,
    pub last_category: KanoCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "transitions", rename_all = "lowercase")]
pub enum Transitions {
    Shifts(Vec<CategoryTransition>),
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityBand {
    High,
    Moderate,
    Stable,
}

#[derive(Debug, Clone, Serialize)]
pub struct VolatilityReport {
    pub summaries: Vec<SwitchSummary>,
    pub most_dynamic: SwitchSummary,
    pub most_stable: SwitchSummary,
    pub transitions: Transitions,
    pub band: VolatilityBand,
}

/// Fitted `value = intercept + slope * t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearTrend {
    pub intercept: f64,
    pub slope: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastResult {
    pub target: ForecastTarget,
    pub horizon: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub model: LinearTrend,
    pub test_actual: Vec<f64>,
    pub test_predictions: Vec<f64>,
    pub predictions: Vec<f64>,
    /// Calendar months of `predictions`; empty when the series carries no dates.
    pub forecast_months: Vec<NaiveDate>,
    pub mae: f64,
    pub rmse: f64,
    /// `None` when a holdout actual is zero.
    pub mape: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TrendLabel {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrendLabel::Increasing => "Increasing",
            TrendLabel::Decreasing => "Decreasing",
            TrendLabel::Stable => "Stable",
        };
        f.write_str(label)
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Importance::High => "High",
            Importance::Medium => "Medium",
            Importance::Low => "Low",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InsightLabel {
    pub target: ForecastTarget,
    pub trend: f64,
    pub trend_label: TrendLabel,
    pub last_value: f64,
    pub p33: f64,
    pub p66: f64,
    pub importance: Importance,
    pub action: &'static str,
}
