use std::fmt::Write;

use crate::config::SliceConfig;
use crate::impact;
use crate::models::{ForecastResult, InsightLabel, Transitions};
use crate::overview;
use crate::store::{KanoTable, MonthlyTable};
use crate::volatility;

/// Report inputs with the year range resolved against each table's own bounds.
#[derive(Debug, Clone)]
pub struct ReportScope {
    /// Span covered by either table after filtering, used for the heading.
    pub year_range: (i32, i32),
    pub monthly: MonthlyTable,
    pub kano: KanoTable,
}

impl ReportScope {
    /// Returns `None` when both tables are empty.
    pub fn resolve(slice: &SliceConfig, monthly: &MonthlyTable, kano: &KanoTable) -> Option<Self> {
        let monthly_range = monthly.year_bounds().map(|bounds| slice.year_range(bounds));
        let kano_range = kano.year_bounds().map(|bounds| slice.year_range(bounds));

        let year_range = match (monthly_range, kano_range) {
            (Some(a), Some(b)) => (a.0.min(b.0), a.1.max(b.1)),
            (Some(range), None) | (None, Some(range)) => range,
            (None, None) => return None,
        };

        let monthly = match monthly_range {
            Some((from, to)) => monthly.filter_by_year_range(from, to),
            None => MonthlyTable::default(),
        };
        let kano = match kano_range {
            Some((from, to)) => kano
                .filter_by_year_range(from, to)
                .select_attributes(&slice.attributes),
            None => KanoTable::default(),
        };

        Some(Self {
            year_range,
            monthly,
            kano,
        })
    }
}

pub fn build_report(
    year_range: (i32, i32),
    monthly: &MonthlyTable,
    kano: &KanoTable,
    forecast: Option<(&ForecastResult, &InsightLabel)>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Dynamic Kano Report");
    let _ = writeln!(
        output,
        "Generated for {}–{} ({} months, {} Kano records)",
        year_range.0,
        year_range.1,
        monthly.len(),
        kano.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Average Rating");

    match overview::rating_summary(monthly) {
        Some(summary) => {
            let _ = writeln!(
                output,
                "- {:.2} → {:.2} (mean {:.2}, range {:.2}–{:.2})",
                summary.first, summary.last, summary.mean, summary.min, summary.max
            );
        }
        None => {
            let _ = writeln!(output, "No monthly records in this range.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Kano Volatility");

    match volatility::volatility_report(kano) {
        Some(report) => {
            let _ = writeln!(
                output,
                "- Most dynamic attribute: {} ({} category changes, {})",
                report.most_dynamic.attribute.title(),
                report.most_dynamic.switch_count,
                report.band.label()
            );
            let _ = writeln!(
                output,
                "- Most stable attribute: {} ({} changes)",
                report.most_stable.attribute.title(),
                report.most_stable.switch_count
            );
            let _ = writeln!(output, "- Key transitions:");
            match &report.transitions {
                Transitions::Shifts(shifts) => {
                    for shift in shifts {
                        let _ = writeln!(
                            output,
                            "  - {}: {} → {}",
                            shift.attribute.title(),
                            shift.first_category,
                            shift.last_category
                        );
                    }
                }
                Transitions::Stable => {
                    let _ = writeln!(
                        output,
                        "  - No significant transitions — categories mostly stable."
                    );
                }
            }
        }
        None => {
            let _ = writeln!(output, "No Kano records in this range.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Attribute Impact");

    let summaries = impact::impact_summary(kano);
    if summaries.is_empty() {
        let _ = writeln!(output, "No Kano records in this range.");
    } else {
        for summary in &summaries {
            let _ = writeln!(
                output,
                "- {}: mean β⁺ {:.3}, mean β⁻ {:.3} across {} months",
                summary.attribute, summary.mean_beta_plus, summary.mean_beta_minus, summary.record_count
            );
        }
        if let Some(top) = impact::top_delighter(&summaries) {
            let _ = writeln!(
                output,
                "- Strongest positive impact: {}",
                top.attribute.title()
            );
        }
    }

    if let Some((result, label)) = forecast {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Forecast: {}", result.target.title());
        let _ = writeln!(
            output,
            "- Trend: {} ({:+.4} over {} months)",
            label.trend_label, label.trend, result.horizon
        );
        let _ = writeln!(output, "- Current importance: {}", label.importance);
        let _ = writeln!(
            output,
            "- Holdout error: MAE {:.3}, RMSE {:.3}, MAPE {}",
            result.mae,
            result.rmse,
            format_mape(result.mape)
        );
        let _ = writeln!(output, "- Recommended action: {}", label.action);
    }

    output
}

pub fn format_mape(mape: Option<f64>) -> String {
    match mape {
        Some(value) => format!("{value:.2}%"),
        None => "n/a (zero actual in holdout)".to_string(),
    }
}
