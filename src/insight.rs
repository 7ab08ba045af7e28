use crate::error::{AnalyticsError, Result};
use crate::models::{ForecastResult, Importance, InsightLabel, TrendLabel};

/// Forecast drift smaller than this in either direction reads as flat.
pub const TREND_DEAD_BAND: f64 = 0.001;

pub const LOW_QUANTILE: f64 = 0.33;
pub const HIGH_QUANTILE: f64 = 0.66;

pub const DEFAULT_ACTION: &str = "Low priority — limited impact for now.";

/// Recommended actions keyed by (importance, trend). Combinations not listed
/// fall back to `DEFAULT_ACTION`.
pub const ACTION_TABLE: [(Importance, TrendLabel, &str); 5] = [
    (
        Importance::High,
        TrendLabel::Increasing,
        "Strong priority — improve & maintain consistency.",
    ),
    (
        Importance::High,
        TrendLabel::Stable,
        "Maintain quality; monitor for early shifts.",
    ),
    (
        Importance::Medium,
        TrendLabel::Increasing,
        "Potential future priority — keep an eye on it.",
    ),
    (
        Importance::Low,
        TrendLabel::Increasing,
        "Growing but not urgent — observe trend.",
    ),
    (
        Importance::High,
        TrendLabel::Decreasing,
        "Warning: important but declining — investigate issues.",
    ),
];

pub fn classify_trend(trend: f64) -> TrendLabel {
    if trend > TREND_DEAD_BAND {
        TrendLabel::Increasing
    } else if trend < -TREND_DEAD_BAND {
        TrendLabel::Decreasing
    } else {
        TrendLabel::Stable
    }
}

/// Both bounds are strict: a value equal to either quantile is Medium.
pub fn classify_importance(last_value: f64, p33: f64, p66: f64) -> Importance {
    if last_value > p66 {
        Importance::High
    } else if last_value < p33 {
        Importance::Low
    } else {
        Importance::Medium
    }
}

pub fn recommended_action(importance: Importance, trend: TrendLabel) -> &'static str {
    ACTION_TABLE
        .iter()
        .find(|(i, t, _)| *i == importance && *t == trend)
        .map(|(_, _, action)| *action)
        .unwrap_or(DEFAULT_ACTION)
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Labels a forecast using its drift and where the latest observation sits
/// within the full observed series.
pub fn insight(result: &ForecastResult, observed: &[f64]) -> Result<InsightLabel> {
    let name = result.target.column_name();
    let (first, last) = match (result.predictions.first(), result.predictions.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(AnalyticsError::insufficient_data(&name, "forecast has no predictions")),
    };
    let last_value = *observed
        .last()
        .ok_or_else(|| AnalyticsError::insufficient_data(&name, "observed series is empty"))?;
    let p33 = quantile(observed, LOW_QUANTILE).unwrap_or(last_value);
    let p66 = quantile(observed, HIGH_QUANTILE).unwrap_or(last_value);

    let trend = last - first;
    let trend_label = classify_trend(trend);
    let importance = classify_importance(last_value, p33, p66);

    Ok(InsightLabel {
        target: result.target,
        trend,
        trend_label,
        last_value,
        p33,
        p66,
        importance,
        action: recommended_action(importance, trend_label),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::forecast_series;
    use crate::models::{ForecastTarget, LinearTrend};

    fn result_with_predictions(predictions: Vec<f64>) -> ForecastResult {
        ForecastResult {
            target: ForecastTarget::AvgRating,
            horizon: predictions.len(),
            train_size: 1,
            test_size: 12,
            model: LinearTrend {
                intercept: 0.0,
                slope: 0.0,
            },
            test_actual: Vec::new(),
            test_predictions: Vec::new(),
            predictions,
            forecast_months: Vec::new(),
            mae: 0.0,
            rmse: 0.0,
            mape: None,
        }
    }

    #[test]
    fn dead_band_is_preserved() {
        assert_eq!(classify_trend(0.0005), TrendLabel::Stable);
        assert_eq!(classify_trend(0.001), TrendLabel::Stable);
        assert_eq!(classify_trend(-0.001), TrendLabel::Stable);
        assert_eq!(classify_trend(0.002), TrendLabel::Increasing);
        assert_eq!(classify_trend(-0.002), TrendLabel::Decreasing);
    }

    #[test]
    fn trend_is_last_minus_first_forecast() {
        let observed = [1.0, 2.0, 3.0];
        let stable = insight(&result_with_predictions(vec![1.0, 9.0, 1.0005]), &observed).unwrap();
        assert_eq!(stable.trend_label, TrendLabel::Stable);
        let up = insight(&result_with_predictions(vec![1.0, 1.002]), &observed).unwrap();
        assert_eq!(up.trend_label, TrendLabel::Increasing);
        let down = insight(&result_with_predictions(vec![1.0, 0.998]), &observed).unwrap();
        assert_eq!(down.trend_label, TrendLabel::Decreasing);
    }

    #[test]
    fn quantile_bounds_are_strict() {
        assert_eq!(classify_importance(0.66, 0.33, 0.66), Importance::Medium);
        assert_eq!(classify_importance(0.33, 0.33, 0.66), Importance::Medium);
        assert_eq!(classify_importance(0.661, 0.33, 0.66), Importance::High);
        assert_eq!(classify_importance(0.329, 0.33, 0.66), Importance::Low);
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 1.0), Some(4.0));
        assert!((quantile(&values, 0.5).unwrap() - 2.5).abs() < 1e-12);
        assert!((quantile(&values, 0.66).unwrap() - 2.98).abs() < 1e-12);
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn importance_uses_last_observed_value() {
        let rising: Vec<f64> = (1..=10).map(f64::from).collect();
        let label = insight(&result_with_predictions(vec![0.0, 0.0]), &rising).unwrap();
        assert_eq!(label.importance, Importance::High);
        assert_eq!(label.last_value, 10.0);

        let falling: Vec<f64> = rising.iter().rev().copied().collect();
        let label = insight(&result_with_predictions(vec![0.0, 0.0]), &falling).unwrap();
        assert_eq!(label.importance, Importance::Low);
        assert_eq!(label.action, DEFAULT_ACTION);
    }

    #[test]
    fn action_table_lookup() {
        assert_eq!(
            recommended_action(Importance::High, TrendLabel::Decreasing),
            "Warning: important but declining — investigate issues."
        );
        assert_eq!(
            recommended_action(Importance::High, TrendLabel::Increasing),
            "Strong priority — improve & maintain consistency."
        );
        assert_eq!(
            recommended_action(Importance::High, TrendLabel::Stable),
            "Maintain quality; monitor for early shifts."
        );
        assert_eq!(
            recommended_action(Importance::Medium, TrendLabel::Increasing),
            "Potential future priority — keep an eye on it."
        );
        assert_eq!(
            recommended_action(Importance::Low, TrendLabel::Increasing),
            "Growing but not urgent — observe trend."
        );
        for (importance, trend) in [
            (Importance::Medium, TrendLabel::Stable),
            (Importance::Medium, TrendLabel::Decreasing),
            (Importance::Low, TrendLabel::Stable),
            (Importance::Low, TrendLabel::Decreasing),
        ] {
            assert_eq!(recommended_action(importance, trend), DEFAULT_ACTION);
        }
    }

    #[test]
    fn high_and_declining_series_warns() {
        let mut values: Vec<f64> = (0..24).map(|t| 10.0 - t as f64 * 0.1).collect();
        values.push(20.0);
        let result = forecast_series(ForecastTarget::AvgRating, &values).unwrap();
        let label = insight(&result, &values).unwrap();
        assert_eq!(label.trend_label, TrendLabel::Decreasing);
        assert_eq!(label.importance, Importance::High);
        assert_eq!(
            label.action,
            "Warning: important but declining — investigate issues."
        );
    }

    #[test]
    fn empty_inputs_are_insufficient() {
        let err = insight(&result_with_predictions(vec![1.0]), &[]).unwrap_err();
        assert!(matches!(err, AnalyticsError::InsufficientData { .. }));
        let err = insight(&result_with_predictions(Vec::new()), &[1.0]).unwrap_err();
        assert!(matches!(err, AnalyticsError::InsufficientData { .. }));
    }
}
