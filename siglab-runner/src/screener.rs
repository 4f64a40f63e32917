//! Multi-symbol screener.
//!
//! Each symbol is fetched and analyzed independently on the rayon pool.
//! A failure is recorded on its own row and never aborts the batch. Rows
//! come back in input order.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use siglab_core::data::DataProvider;
use siglab_core::{AnalysisConfig, ParamError};

use crate::analysis::{analyze, AnalyzeOptions};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ScreenOutcome {
    /// Names of the signals holding on the last bar (possibly none).
    Signals(Vec<String>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenRow {
    pub symbol: String,
    pub outcome: ScreenOutcome,
}

impl ScreenRow {
    /// The `signals` cell of the export: names joined with `;`, or the error.
    pub fn signals_cell(&self) -> String {
        match &self.outcome {
            ScreenOutcome::Signals(names) => names.join(";"),
            ScreenOutcome::Failed(reason) => format!("error: {reason}"),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ScreenOutcome::Failed(_))
    }
}

/// Split a free-form symbol list on commas and whitespace, dropping blanks
/// and duplicates while keeping first-seen order.
pub fn parse_symbols(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in text.split(|c: char| c == ',' || c == '，' || c.is_whitespace()) {
        let token = token.trim();
        if !token.is_empty() && !out.iter().any(|s| s == token) {
            out.push(token.to_string());
        }
    }
    out
}

/// Screen `symbols` over `start..=end` with one shared, validated config.
pub fn screen(
    provider: &dyn DataProvider,
    symbols: &[String],
    cfg: &AnalysisConfig,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ScreenRow>, ParamError> {
    cfg.validate()?;
    let opts = AnalyzeOptions {
        backtest: false,
        recent_closes: 0,
        ..AnalyzeOptions::default()
    };

    let rows: Vec<ScreenRow> = symbols
        .par_iter()
        .map(|symbol| {
            let outcome = match provider.fetch(symbol, start, end) {
                Ok(fetched) => match analyze(&fetched.series, cfg, &opts) {
                    Ok(report) => ScreenOutcome::Signals(report.held_names()),
                    Err(e) => ScreenOutcome::Failed(e.to_string()),
                },
                Err(e) => {
                    tracing::warn!(symbol = %symbol, error = %e, "screen fetch failed");
                    ScreenOutcome::Failed(e.to_string())
                }
            };
            ScreenRow {
                symbol: symbol.clone(),
                outcome,
            }
        })
        .collect();

    tracing::info!(
        provider = provider.name(),
        symbols = rows.len(),
        failed = rows.iter().filter(|r| r.is_failed()).count(),
        "screen complete"
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_symbols_handles_mixed_separators() {
        let parsed = parse_symbols("000001\n000002, 600519，000001  300750");
        assert_eq!(parsed, vec!["000001", "000002", "600519", "300750"]);
        assert!(parse_symbols(" ,\n ").is_empty());
    }

    #[test]
    fn signals_cell_format() {
        let ok = ScreenRow {
            symbol: "000001".into(),
            outcome: ScreenOutcome::Signals(vec!["MACD_bullish_cross".into(), "60_day_high".into()]),
        };
        assert_eq!(ok.signals_cell(), "MACD_bullish_cross;60_day_high");

        let none = ScreenRow {
            symbol: "000002".into(),
            outcome: ScreenOutcome::Signals(vec![]),
        };
        assert_eq!(none.signals_cell(), "");

        let failed = ScreenRow {
            symbol: "000003".into(),
            outcome: ScreenOutcome::Failed("symbol not found: 000003".into()),
        };
        assert_eq!(failed.signals_cell(), "error: symbol not found: 000003");
        assert!(failed.is_failed());
    }
}
