use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dta_kano::config::{self, DashboardConfig, SliceConfig, DEFAULT_STEP_ATTRIBUTES};
use dta_kano::models::{
    Attribute, AttributePoint, BetaPoint, CategoryComposition, CategoryStep, ForecastResult,
    ForecastTarget, ImpactSummary, InsightLabel, KanoCategory, RatingPoint, RatingSummary,
    Transitions, VolatilityReport,
};
use dta_kano::overview::{self, SignalKind};
use dta_kano::store::TableCache;
use dta_kano::{forecast, impact, insight, kano, report, volatility};

#[derive(Parser)]
#[command(name = "dta-kano")]
#[command(
    about = "Dynamic time-aware Kano analytics and trend forecasting for dessert & cafe reviews",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Monthly attribute table (CSV)
    #[arg(long, global = true, env = "DTA_KANO_MONTHLY", default_value = config::DEFAULT_MONTHLY_PATH)]
    monthly: PathBuf,

    /// Kano category table (CSV)
    #[arg(long, global = true, env = "DTA_KANO_TABLE", default_value = config::DEFAULT_KANO_PATH)]
    kano: PathBuf,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Args)]
struct SliceArgs {
    /// First year to include (defaults to the table's first year)
    #[arg(long)]
    from_year: Option<i32>,
    /// Last year to include (defaults to the table's last year)
    #[arg(long)]
    to_year: Option<i32>,
    /// Comma separated attributes, e.g. "taste,service"
    #[arg(long)]
    attributes: Option<String>,
}

impl SliceArgs {
    fn resolve(&self, default_attributes: &[Attribute]) -> anyhow::Result<SliceConfig> {
        SliceConfig::new(
            self.from_year,
            self.to_year,
            self.attributes.as_deref(),
            default_attributes,
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly rating, sentiment and mention trends
    Overview {
        #[command(flatten)]
        slice: SliceArgs,
    },
    /// Kano category evolution, composition and volatility
    Kano {
        #[command(flatten)]
        slice: SliceArgs,
    },
    /// Mean β⁺ / β⁻ per attribute and their trend
    Impact {
        #[command(flatten)]
        slice: SliceArgs,
    },
    /// Fit a linear trend and forecast the next 12 months
    Forecast {
        /// Column to forecast: avg_rating or {attribute}_weighted_sentiment
        #[arg(long, default_value = "avg_rating")]
        target: String,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        slice: SliceArgs,
        #[arg(long, default_value = "avg_rating")]
        target: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Serialize)]
struct OverviewView {
    year_range: (i32, i32),
    summary: Option<RatingSummary>,
    rating: Vec<RatingPoint>,
    sentiment: Vec<AttributePoint>,
    mentions: Vec<AttributePoint>,
}

#[derive(Serialize)]
struct KanoView {
    year_range: (i32, i32),
    steps: Vec<CategoryStep>,
    composition: Vec<CategoryComposition>,
    volatility: Option<VolatilityReport>,
}

#[derive(Serialize)]
struct ImpactView {
    year_range: (i32, i32),
    summaries: Vec<ImpactSummary>,
    trend: Vec<BetaPoint>,
}

#[derive(Serialize)]
struct ForecastView<'a> {
    forecast: &'a ForecastResult,
    insight: &'a InsightLabel,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, &cli.log_format);

    let dashboard = DashboardConfig {
        monthly_path: cli.monthly.clone(),
        kano_path: cli.kano.clone(),
    };
    dashboard.validate()?;
    let tables = TableCache::new(&dashboard.monthly_path, &dashboard.kano_path);

    match cli.command {
        Commands::Overview { slice } => {
            let slice = slice.resolve(&Attribute::ALL)?;
            let monthly = tables
                .monthly()
                .with_context(|| format!("failed to load {}", dashboard.monthly_path.display()))?;
            let Some(bounds) = monthly.year_bounds() else {
                println!("Monthly table is empty.");
                return Ok(());
            };
            let year_range = slice.year_range(bounds);
            let filtered = monthly.filter_by_year_range(year_range.0, year_range.1);

            let view = OverviewView {
                year_range,
                summary: overview::rating_summary(&filtered),
                rating: overview::rating_trend(&filtered),
                sentiment: overview::attribute_trend(
                    &filtered,
                    &slice.attributes,
                    SignalKind::WeightedSentiment,
                ),
                mentions: overview::attribute_trend(&filtered, &slice.attributes, SignalKind::Mention),
            };
            if cli.json {
                print_json(&view)?;
                return Ok(());
            }

            println!("Average rating {}–{}:", year_range.0, year_range.1);
            match &view.summary {
                Some(summary) => println!(
                    "- {:.2} → {:.2} over {} months (mean {:.2}, range {:.2}–{:.2})",
                    summary.first, summary.last, summary.months, summary.mean, summary.min, summary.max
                ),
                None => println!("- No months in this range."),
            }
            for point in &view.rating {
                println!("  {} {:.3}", point.month.format("%Y-%m"), point.avg_rating);
            }
            println!("Mention volume:");
            for (attribute, total) in overview::mention_totals(&filtered, &slice.attributes) {
                println!("- {}: {} mentions", attribute, total);
            }
        }
        Commands::Kano { slice } => {
            let slice = slice.resolve(&DEFAULT_STEP_ATTRIBUTES)?;
            let kano = tables
                .kano()
                .with_context(|| format!("failed to load {}", dashboard.kano_path.display()))?;
            let Some(bounds) = kano.year_bounds() else {
                println!("Kano table is empty.");
                return Ok(());
            };
            let year_range = slice.year_range(bounds);
            let filtered = kano.filter_by_year_range(year_range.0, year_range.1);

            let view = KanoView {
                year_range,
                steps: kano::category_steps(&filtered, &slice.attributes),
                composition: kano::composition(&filtered),
                volatility: volatility::volatility_report(&filtered),
            };
            if cli.json {
                print_json(&view)?;
                return Ok(());
            }

            let Some(report) = &view.volatility else {
                println!("No Kano records found for {}–{}.", year_range.0, year_range.1);
                return Ok(());
            };
            println!("Category switches {}–{}:", year_range.0, year_range.1);
            let mut ranked = report.summaries.clone();
            ranked.sort_by(|a, b| b.switch_count.cmp(&a.switch_count));
            for summary in &ranked {
                println!(
                    "- {}: {} switches ({} → {})",
                    summary.attribute, summary.switch_count, summary.first_category, summary.last_category
                );
            }
            println!(
                "Most dynamic: {} ({} changes, {})",
                report.most_dynamic.attribute.title(),
                report.most_dynamic.switch_count,
                report.band.label()
            );
            println!(
                "Most stable: {} ({} changes)",
                report.most_stable.attribute.title(),
                report.most_stable.switch_count
            );
            match &report.transitions {
                Transitions::Shifts(shifts) => {
                    println!("Key transitions:");
                    for shift in shifts {
                        println!(
                            "- {}: {} → {}",
                            shift.attribute.title(),
                            shift.first_category,
                            shift.last_category
                        );
                    }
                }
                Transitions::Stable => {
                    println!("No significant transitions — categories mostly stable.")
                }
            }
            if let Some(latest) = view.composition.last() {
                let mix: Vec<String> = KanoCategory::ORDER
                    .iter()
                    .map(|category| format!("{} {}", category, latest.counts[category.ordinal() as usize]))
                    .collect();
                println!("Composition in {}: {}", latest.month, mix.join(", "));
            }
        }
        Commands::Impact { slice } => {
            let slice = slice.resolve(&Attribute::ALL)?;
            let kano = tables
                .kano()
                .with_context(|| format!("failed to load {}", dashboard.kano_path.display()))?;
            let Some(bounds) = kano.year_bounds() else {
                println!("Kano table is empty.");
                return Ok(());
            };
            let year_range = slice.year_range(bounds);
            let filtered = kano.filter_by_year_range(year_range.0, year_range.1);

            let view = ImpactView {
                year_range,
                summaries: impact::impact_summary(&filtered),
                trend: impact::beta_trend(&filtered, &slice.attributes),
            };
            if cli.json {
                print_json(&view)?;
                return Ok(());
            }

            if view.summaries.is_empty() {
                println!("No Kano records found for {}–{}.", year_range.0, year_range.1);
                return Ok(());
            }
            println!("Mean impact per attribute ({}–{}):", year_range.0, year_range.1);
            for summary in &view.summaries {
                println!(
                    "- {}: β⁺ {:.3}, β⁻ {:.3} ({} months)",
                    summary.attribute, summary.mean_beta_plus, summary.mean_beta_minus, summary.record_count
                );
            }
            if let Some(top) = impact::top_delighter(&view.summaries) {
                println!("Strongest positive impact: {}", top.attribute.title());
            }
        }
        Commands::Forecast { target } => {
            let target: ForecastTarget = target.parse()?;
            let monthly = tables
                .monthly()
                .with_context(|| format!("failed to load {}", dashboard.monthly_path.display()))?;
            let result = forecast::forecast(monthly, target)?;
            let label = insight::insight(&result, &monthly.series(target))?;

            if cli.json {
                print_json(&ForecastView {
                    forecast: &result,
                    insight: &label,
                })?;
                return Ok(());
            }

            println!("Forecast for {} (next {} months):", target.title(), result.horizon);
            for (index, value) in result.predictions.iter().enumerate() {
                match result.forecast_months.get(index) {
                    Some(month) => println!("- {} {:.4}", month.format("%Y-%m"), value),
                    None => println!("- F+{} {:.4}", index + 1, value),
                }
            }
            println!(
                "Holdout error: MAE {:.4}, RMSE {:.4}, MAPE {}",
                result.mae,
                result.rmse,
                report::format_mape(result.mape)
            );
            println!("Trend: {}", label.trend_label);
            println!("Current importance: {}", label.importance);
            println!("Recommended action: {}", label.action);
        }
        Commands::Report { slice, target, out } => {
            let slice = slice.resolve(&Attribute::ALL)?;
            let target: ForecastTarget = target.parse()?;
            let monthly = tables
                .monthly()
                .with_context(|| format!("failed to load {}", dashboard.monthly_path.display()))?;
            let kano = tables
                .kano()
                .with_context(|| format!("failed to load {}", dashboard.kano_path.display()))?;
            let scope = report::ReportScope::resolve(&slice, monthly, kano)
                .context("both input tables are empty")?;

            // a forecast failure only drops the forecast section
            let forecast_section = match forecast::forecast(monthly, target) {
                Ok(result) => match insight::insight(&result, &monthly.series(target)) {
                    Ok(label) => Some((result, label)),
                    Err(err) => {
                        tracing::warn!(error = %err, "insight unavailable");
                        None
                    }
                },
                Err(err) => {
                    tracing::warn!(error = %err, "forecast unavailable");
                    None
                }
            };

            let report = report::build_report(
                scope.year_range,
                &scope.monthly,
                &scope.kano,
                forecast_section.as_ref().map(|(result, label)| (result, label)),
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing(verbose: bool, format: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            tracing_subscriber::EnvFilter::new("dta_kano=debug,info")
        } else {
            tracing_subscriber::EnvFilter::new("dta_kano=info,warn")
        }
    });

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
