//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over data sources (CSV directories,
//! synthetic data, test fixtures) so the screener and CLI can swap them.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Series, SeriesError};

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV at row {row}: {message}")]
    Csv { row: usize, message: String },

    #[error("missing column '{column}' (expected English or akshare headers)")]
    MissingColumn { column: &'static str },

    #[error("unparseable date '{value}' at row {row}")]
    BadDate { row: usize, value: String },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no bars for '{symbol}' between {start} and {end}")]
    NoBarsInRange {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("invalid series: {0}")]
    Invalid(#[from] SeriesError),
}

/// Result of a successful data fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub series: Series,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    CsvImport,
    Synthetic,
}

impl DataSource {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, DataSource::Synthetic)
    }
}

/// A supplier of validated daily series.
///
/// Providers are shared across screener worker threads.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars for `symbol` dated within `start..=end`.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;
}
