use chrono::{Months, NaiveDate};
use tracing::{debug, info, warn};

use crate::error::{AnalyticsError, Result};
use crate::models::{ForecastResult, ForecastTarget, LinearTrend};
use crate::store::MonthlyTable;

/// Periods projected past the last observation.
pub const HORIZON: usize = 12;

/// Trailing observations held out for error metrics.
pub const TEST_SIZE: usize = 12;

impl LinearTrend {
    /// Ordinary least squares of `values[t]` on `t = 0..n`. A single
    /// observation yields a flat line through it.
    pub fn fit(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean_t = (n - 1.0) / 2.0;
        let mean_y = values.iter().sum::<f64>() / n;

        let (sxy, sxx) = values
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(sxy, sxx), (t, value)| {
                let dt = t as f64 - mean_t;
                (sxy + dt * (value - mean_y), sxx + dt * dt)
            });
        let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };

        Some(Self {
            intercept: mean_y - slope * mean_t,
            slope,
        })
    }

    pub fn predict(&self, t: usize) -> f64 {
        self.intercept + self.slope * t as f64
    }

    pub fn predict_range(&self, range: std::ops::Range<usize>) -> Vec<f64> {
        range.map(|t| self.predict(t)).collect()
    }
}

/// Splits off the trailing `test_size` observations. Fails unless both
/// partitions are non-empty and the holdout is complete.
pub fn holdout_split<'a>(
    target: &str,
    values: &'a [f64],
    test_size: usize,
) -> Result<(&'a [f64], &'a [f64])> {
    if values.len() <= test_size {
        return Err(AnalyticsError::insufficient_data(
            target,
            format!(
                "{} observations, need at least {} ({} holdout + 1 training)",
                values.len(),
                test_size + 1,
                test_size
            ),
        ));
    }
    Ok(values.split_at(values.len() - test_size))
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    total / actual.len() as f64
}

pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    (total / actual.len() as f64).sqrt()
}

/// Mean of `|actual - predicted| / |actual|` as a percentage. Fails on the
/// first zero actual.
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    let mut total = 0.0;
    for (index, (a, p)) in actual.iter().zip(predicted).enumerate() {
        if *a == 0.0 {
            return Err(AnalyticsError::DivisionByZero { index });
        }
        total += ((a - p) / a).abs();
    }
    Ok(total / actual.len() as f64 * 100.0)
}

/// Forecasts one column of the monthly table, labelling projections with the
/// months after the table's last month.
pub fn forecast(table: &MonthlyTable, target: ForecastTarget) -> Result<ForecastResult> {
    let values = table.series(target);
    let mut result = forecast_series(target, &values)?;
    if let Some(last_month) = table.records().last().map(|record| record.month) {
        result.forecast_months = forecast_months(last_month, HORIZON);
    }
    Ok(result)
}

/// Same as [`forecast`] over a bare series indexed by row order.
pub fn forecast_series(target: ForecastTarget, values: &[f64]) -> Result<ForecastResult> {
    let name = target.column_name();
    let (train, test) = holdout_split(&name, values, TEST_SIZE)?;
    let model = LinearTrend::fit(train)
        .ok_or_else(|| AnalyticsError::insufficient_data(&name, "empty training partition"))?;
    debug!(
        target = %name,
        train = train.len(),
        slope = model.slope,
        intercept = model.intercept,
        "fitted linear trend"
    );

    let test_predictions = model.predict_range(train.len()..values.len());
    let mae = mean_absolute_error(test, &test_predictions);
    let rmse = root_mean_squared_error(test, &test_predictions);
    let mape = match mean_absolute_percentage_error(test, &test_predictions) {
        Ok(mape) => Some(mape),
        Err(AnalyticsError::DivisionByZero { index }) => {
            warn!(target = %name, index, "zero holdout actual, MAPE unavailable");
            None
        }
        Err(err) => return Err(err),
    };

    let predictions = model.predict_range(values.len()..values.len() + HORIZON);
    info!(target = %name, mae, rmse, ?mape, "forecast complete");

    Ok(ForecastResult {
        target,
        horizon: HORIZON,
        train_size: train.len(),
        test_size: test.len(),
        model,
        test_actual: test.to_vec(),
        test_predictions,
        predictions,
        forecast_months: Vec::new(),
        mae,
        rmse,
        mape,
    })
}

pub fn forecast_months(last_month: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as u32)
        .filter_map(|step| last_month.checked_add_months(Months::new(step)))
        .collect()
}
