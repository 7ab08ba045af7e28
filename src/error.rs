use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyticsError>;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Insufficient data for {target}: {detail}")]
    InsufficientData { target: String, detail: String },

    #[error("Division by zero: holdout actual at index {index} is zero")]
    DivisionByZero { index: usize },

    #[error("Unknown Kano category: {0}")]
    UnknownCategory(String),

    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Unknown forecast target: {0}")]
    UnknownTarget(String),

    #[error("Invalid value in row {row}, column {column}: {value:?}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Duplicate month {0} in monthly table")]
    DuplicateMonth(NaiveDate),

    #[error("Kano records for {attribute} are out of order at month {month}")]
    KanoOrder { attribute: String, month: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalyticsError {
    pub fn insufficient_data(target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InsufficientData {
            target: target.into(),
            detail: detail.into(),
        }
    }

    pub fn invalid_value(row: usize, column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            row,
            column: column.into(),
            value: value.into(),
        }
    }
}
