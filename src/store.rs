use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::error::{AnalyticsError, Result};
use crate::models::{Attribute, AttributeSignal, ForecastTarget, KanoRecord, MonthlyAttributeRecord};

/// Accepted names for the month column, in priority order.
const MONTH_CANDIDATES: [&str; 4] = ["month", "date", "period", "timestamp"];

const KANO_COLUMNS: [&str; 5] = ["attribute", "month", "category", "beta_plus", "beta_minus"];

/// Monthly attribute table, sorted by month with one record per month.
#[derive(Debug, Clone, Default)]
pub struct MonthlyTable {
    records: Vec<MonthlyAttributeRecord>,
}

impl MonthlyTable {
    pub fn from_records(mut records: Vec<MonthlyAttributeRecord>) -> Result<Self> {
        records.sort_by_key(|record| record.month);
        if let Some(pair) = records.windows(2).find(|pair| pair[0].month == pair[1].month) {
            return Err(AnalyticsError::DuplicateMonth(pair[1].month));
        }
        Ok(Self { records })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let table = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            months = table.len(),
            "loaded monthly attribute table"
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|header| header.to_lowercase())
            .collect();

        let month_index = MONTH_CANDIDATES
            .iter()
            .find_map(|candidate| headers.iter().position(|header| header == candidate))
            .ok_or_else(|| {
                AnalyticsError::Schema(format!(
                    "no month/date column found (accepted: {}); columns found: {}",
                    MONTH_CANDIDATES.join(", "),
                    headers.join(", ")
                ))
            })?;
        let rating_index = column_index(&headers, "avg_rating")?;
        let mut signal_indices = [(0usize, 0usize); 6];
        for attribute in Attribute::ALL {
            signal_indices[attribute.index()] = (
                column_index(&headers, &attribute.sentiment_column())?,
                column_index(&headers, &attribute.mention_column())?,
            );
        }

        let mut records = Vec::new();
        for (offset, result) in reader.records().enumerate() {
            let row = result?;
            let row_number = offset + 1;
            let raw_month = row.get(month_index).unwrap_or_default();
            let month = parse_month(raw_month)
                .ok_or_else(|| AnalyticsError::invalid_value(row_number, "month", raw_month))?;
            let avg_rating = parse_real(&row, rating_index, row_number, "avg_rating")?;

            let mut signals = [AttributeSignal {
                weighted_sentiment: 0.0,
                mention: 0,
            }; 6];
            for attribute in Attribute::ALL {
                let (sentiment_index, mention_index) = signal_indices[attribute.index()];
                signals[attribute.index()] = AttributeSignal {
                    weighted_sentiment: parse_real(
                        &row,
                        sentiment_index,
                        row_number,
                        &attribute.sentiment_column(),
                    )?,
                    mention: parse_mention(
                        &row,
                        mention_index,
                        row_number,
                        &attribute.mention_column(),
                    )?,
                };
            }

            records.push(MonthlyAttributeRecord {
                month,
                avg_rating,
                signals,
            });
        }

        Self::from_records(records)
    }

    pub fn records(&self) -> &[MonthlyAttributeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let first = self.records.first()?;
        let last = self.records.last()?;
        Some((first.month.year(), last.month.year()))
    }

    /// Inclusive on both ends.
    pub fn filter_by_year_range(&self, year_min: i32, year_max: i32) -> MonthlyTable {
        let records: Vec<_> = self
            .records
            .iter()
            .filter(|record| (year_min..=year_max).contains(&record.month.year()))
            .cloned()
            .collect();
        debug!(year_min, year_max, months = records.len(), "filtered monthly table");
        MonthlyTable { records }
    }

    pub fn series(&self, target: ForecastTarget) -> Vec<f64> {
        self.records.iter().map(|record| target.value(record)).collect()
    }
}

/// Kano table. For each attribute, records are in strictly increasing month order.
#[derive(Debug, Clone, Default)]
pub struct KanoTable {
    records: Vec<KanoRecord>,
}

impl KanoTable {
    pub fn from_records(records: Vec<KanoRecord>) -> Result<Self> {
        let mut last_month: HashMap<Attribute, &str> = HashMap::new();
        for record in &records {
            if let Some(previous) = last_month.insert(record.attribute, &record.month) {
                if previous >= record.month.as_str() {
                    return Err(AnalyticsError::KanoOrder {
                        attribute: record.attribute.to_string(),
                        month: record.month.clone(),
                    });
                }
            }
        }
        Ok(Self { records })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let table = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            records = table.len(),
            attributes = table.attributes().len(),
            "loaded Kano table"
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        #[derive(serde::Deserialize)]
        struct CsvRow {
            attribute: String,
            month: String,
            category: String,
            beta_plus: String,
            beta_minus: String,
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let missing: Vec<&str> = KANO_COLUMNS
            .iter()
            .copied()
            .filter(|column| !headers.iter().any(|header| header == column))
            .collect();
        if !missing.is_empty() {
            return Err(AnalyticsError::Schema(format!(
                "Kano table is missing column(s): {}",
                missing.join(", ")
            )));
        }

        let mut records = Vec::new();
        for (offset, result) in reader.deserialize::<CsvRow>().enumerate() {
            let row = result?;
            let row_number = offset + 1;
            let year = row
                .month
                .get(..4)
                .and_then(|prefix| prefix.parse::<i32>().ok())
                .ok_or_else(|| AnalyticsError::invalid_value(row_number, "month", &row.month))?;

            records.push(KanoRecord {
                attribute: row.attribute.parse()?,
                category: row.category.parse()?,
                month: row.month,
                year,
                beta_plus: parse_finite(&row.beta_plus, row_number, "beta_plus")?,
                beta_minus: parse_finite(&row.beta_minus, row_number, "beta_minus")?,
            });
        }

        Self::from_records(records)
    }

    pub fn records(&self) -> &[KanoRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let min = self.records.iter().map(|record| record.year).min()?;
        let max = self.records.iter().map(|record| record.year).max()?;
        Some((min, max))
    }

    /// Attributes present in the table, in order of first appearance.
    pub fn attributes(&self) -> Vec<Attribute> {
        let mut seen = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.attribute) {
                seen.push(record.attribute);
            }
        }
        seen
    }

    pub fn records_for(&self, attribute: Attribute) -> impl Iterator<Item = &KanoRecord> + '_ {
        self.records
            .iter()
            .filter(move |record| record.attribute == attribute)
    }

    /// Inclusive on both ends.
    pub fn filter_by_year_range(&self, year_min: i32, year_max: i32) -> KanoTable {
        let records: Vec<_> = self
            .records
            .iter()
            .filter(|record| (year_min..=year_max).contains(&record.year))
            .cloned()
            .collect();
        debug!(year_min, year_max, records = records.len(), "filtered Kano table");
        KanoTable { records }
    }

    pub fn select_attributes(&self, attributes: &[Attribute]) -> KanoTable {
        KanoTable {
            records: self
                .records
                .iter()
                .filter(|record| attributes.contains(&record.attribute))
                .cloned()
                .collect(),
        }
    }
}

/// Both source tables, each read from disk at most once per process.
#[derive(Debug)]
pub struct TableCache {
    monthly_path: PathBuf,
    kano_path: PathBuf,
    monthly: OnceLock<MonthlyTable>,
    kano: OnceLock<KanoTable>,
}

impl TableCache {
    pub fn new(monthly_path: impl Into<PathBuf>, kano_path: impl Into<PathBuf>) -> Self {
        Self {
            monthly_path: monthly_path.into(),
            kano_path: kano_path.into(),
            monthly: OnceLock::new(),
            kano: OnceLock::new(),
        }
    }

    pub fn monthly(&self) -> Result<&MonthlyTable> {
        if let Some(table) = self.monthly.get() {
            return Ok(table);
        }
        let table = MonthlyTable::from_path(&self.monthly_path)?;
        Ok(self.monthly.get_or_init(|| table))
    }

    pub fn kano(&self) -> Result<&KanoTable> {
        if let Some(table) = self.kano.get() {
            return Ok(table);
        }
        let table = KanoTable::from_path(&self.kano_path)?;
        Ok(self.kano.get_or_init(|| table))
    }
}

fn column_index(headers: &[String], name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| AnalyticsError::Schema(format!("missing column: {name}")))
}

/// Parses a date-like cell and truncates it to the first of its month.
pub fn parse_month(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y/%m/%d"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d"))
        .ok()?;
    date.with_day(1)
}

fn parse_real(row: &csv::StringRecord, index: usize, row_number: usize, column: &str) -> Result<f64> {
    parse_finite(row.get(index).unwrap_or_default(), row_number, column)
}

/// Rejects NaN and infinities along with unparseable text.
fn parse_finite(raw: &str, row_number: usize, column: &str) -> Result<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| AnalyticsError::invalid_value(row_number, column, raw))
}

/// Mention counts may be exported as "12" or "12.0".
fn parse_mention(
    row: &csv::StringRecord,
    index: usize,
    row_number: usize,
    column: &str,
) -> Result<u32> {
    let raw = row.get(index).unwrap_or_default();
    raw.parse::<u32>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|value| *value >= 0.0 && value.fract() == 0.0 && *value <= u32::MAX as f64)
                .map(|value| value as u32)
        })
        .ok_or_else(|| AnalyticsError::invalid_value(row_number, column, raw))
}
