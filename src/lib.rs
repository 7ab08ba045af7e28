//! Dynamic time-aware Kano analytics over monthly review attributes.
//!
//! The two source tables are loaded once through [`store::TableCache`]; every
//! other module is a pure computation over a filtered slice of them.

pub mod config;
pub mod error;
pub mod forecast;
pub mod impact;
pub mod insight;
pub mod kano;
pub mod models;
pub mod overview;
pub mod report;
pub mod store;
pub mod volatility;

pub use error::{AnalyticsError, Result};
