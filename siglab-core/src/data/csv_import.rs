//! CSV import of daily bars.
//!
//! Accepts either `date,open,high,low,close,volume` or the akshare export
//! headers `日期,开盘,收盘,最高,最低,成交量`. Extra columns are ignored.
//! Dates may be `YYYY-MM-DD`, `YYYY/MM/DD` or `YYYYMMDD`. Rows are sorted by
//! date before validation.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::{Bar, Series};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// (canonical name, akshare name)
const COLUMNS: [(&str, &str); 6] = [
    ("date", "日期"),
    ("open", "开盘"),
    ("high", "最高"),
    ("low", "最低"),
    ("close", "收盘"),
    ("volume", "成交量"),
];

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "日期")]
    date: String,
    #[serde(alias = "开盘")]
    open: f64,
    #[serde(alias = "最高")]
    high: f64,
    #[serde(alias = "最低")]
    low: f64,
    #[serde(alias = "收盘")]
    close: f64,
    #[serde(alias = "成交量")]
    volume: f64,
}

/// Reads `<dir>/<symbol>.csv`.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let series = read_csv_series(&path, symbol)?
            .within(start, end)
            .ok_or_else(|| DataError::NoBarsInRange {
                symbol: symbol.to_string(),
                start,
                end,
            })?;
        Ok(FetchResult {
            series,
            source: DataSource::CsvImport,
        })
    }
}

/// Load a whole CSV file as a series.
pub fn read_csv_series(path: &Path, symbol: &str) -> Result<Series, DataError> {
    let file = std::fs::File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let series = parse_csv(file, symbol)?;
    tracing::debug!(
        symbol,
        path = %path.display(),
        bars = series.len(),
        "csv loaded"
    );
    Ok(series)
}

/// Parse CSV bars from any reader.
pub fn parse_csv<R: Read>(reader: R, symbol: &str) -> Result<Series, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| DataError::Csv {
            row: 0,
            message: e.to_string(),
        })?
        .clone();
    for (canonical, akshare) in COLUMNS {
        if !headers.iter().any(|h| h == canonical || h == akshare) {
            return Err(DataError::MissingColumn { column: canonical });
        }
    }

    let mut bars = Vec::new();
    for (i, record) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = i + 1;
        let record = record.map_err(|e| DataError::Csv {
            row,
            message: e.to_string(),
        })?;
        let date = parse_date(&record.date).ok_or_else(|| DataError::BadDate {
            row,
            value: record.date.clone(),
        })?;
        bars.push(Bar {
            date,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }

    Ok(Series::from_unsorted(symbol, bars)?)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}
