//! Single-symbol analysis: the request pipeline.
//!
//! `analyze` validates the config, resolves the evaluation bar, truncates the
//! series there (no look-ahead), computes the frame, evaluates signals and
//! optionally runs the backtest. The result is a self-describing report
//! carrying its schema version and a BLAKE3 fingerprint of its inputs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use siglab_core::backtest::run_backtest;
use siglab_core::indicators::{FRAME_SCHEMA_VERSION, IndicatorFrame, IndicatorSnapshot};
use siglab_core::signals::evaluate_signals;
use siglab_core::{AnalysisConfig, BacktestReport, ParamError, Series, SignalReport};

/// Current schema version for persisted reports.
/// Increment when the report format changes in a backward-incompatible way.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] ParamError),

    #[error("no bar for '{symbol}' on or before {requested} (series starts {first})")]
    DateOutOfRange {
        symbol: String,
        requested: NaiveDate,
        first: NaiveDate,
    },
}

/// Per-request switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeOptions {
    /// Evaluate as of this date (last bar on or before it). `None` = last bar.
    pub at: Option<NaiveDate>,
    pub backtest: bool,
    /// Trailing closes copied into the report for commentary.
    pub recent_closes: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            at: None,
            backtest: true,
            recent_closes: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentClose {
    pub date: NaiveDate,
    pub close: f64,
}

/// Everything known about one symbol at one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub schema_version: u32,
    pub frame_schema_version: u32,
    pub symbol: String,
    /// Index of the evaluated bar in the input series.
    pub bar_index: usize,
    pub date: NaiveDate,
    pub close: f64,
    pub snapshot: IndicatorSnapshot,
    pub signals: Vec<SignalReport>,
    pub backtest: Option<BacktestReport>,
    pub recent_closes: Vec<RecentClose>,
    pub config: AnalysisConfig,
    pub config_hash: String,
    /// Bars with inconsistent OHLC (reported, not rejected).
    pub insane_bars: usize,
}

impl AnalysisReport {
    pub fn held_signals(&self) -> impl Iterator<Item = &SignalReport> {
        self.signals.iter().filter(|s| s.holds())
    }

    pub fn held_names(&self) -> Vec<String> {
        self.held_signals().map(|s| s.name.clone()).collect()
    }
}

/// Run the full pipeline for one series.
pub fn analyze(
    series: &Series,
    cfg: &AnalysisConfig,
    opts: &AnalyzeOptions,
) -> Result<AnalysisReport, AnalysisError> {
    let _span = tracing::info_span!("analyze", symbol = series.symbol()).entered();
    cfg.validate()?;

    let index = match opts.at {
        None => series.last_index(),
        Some(date) => series
            .index_on_or_before(date)
            .ok_or_else(|| AnalysisError::DateOutOfRange {
                symbol: series.symbol().to_string(),
                requested: date,
                first: series.first_date(),
            })?,
    };
    let view = series.truncate_to(index);
    tracing::debug!(index, bars = view.len(), "evaluation bar resolved");

    let frame = IndicatorFrame::compute(&view, &cfg.indicator_params());
    let signals = evaluate_signals(&view, &frame, cfg);
    let backtest = opts
        .backtest
        .then(|| run_backtest(&view, &frame, &cfg.backtest));

    let insane_bars = view.insane_bars().len();
    if insane_bars > 0 {
        tracing::warn!(insane_bars, "bars with inconsistent OHLC");
    }

    let last = view.last();
    let recent_closes = view
        .tail(opts.recent_closes)
        .bars()
        .iter()
        .map(|b| RecentClose {
            date: b.date,
            close: b.close,
        })
        .take(opts.recent_closes)
        .collect();

    let report = AnalysisReport {
        schema_version: SCHEMA_VERSION,
        frame_schema_version: FRAME_SCHEMA_VERSION,
        symbol: series.symbol().to_string(),
        bar_index: index,
        date: last.date,
        close: last.close,
        snapshot: frame.snapshot(index),
        signals,
        backtest,
        recent_closes,
        config: cfg.clone(),
        config_hash: config_hash(cfg, &view),
        insane_bars,
    };

    tracing::info!(
        date = %report.date,
        held = ?report.held_names(),
        trades = report.backtest.as_ref().map_or(0, |b| b.trades.len()),
        "analysis complete"
    );
    Ok(report)
}

/// BLAKE3 fingerprint of the config and every bar the analysis saw.
pub fn config_hash(cfg: &AnalysisConfig, series: &Series) -> String {
    let mut hasher = blake3::Hasher::new();
    if let Ok(json) = serde_json::to_vec(cfg) {
        hasher.update(&json);
    }
    hasher.update(series.symbol().as_bytes());
    for bar in series.bars() {
        hasher.update(bar.date.to_string().as_bytes());
        for v in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
            hasher.update(&v.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use siglab_core::domain::bars_from_closes;

    fn series() -> Series {
        Series::new("000001", bars_from_closes(&[10.0, 10.2, 10.1, 10.4, 10.6])).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected_before_work() {
        let mut cfg = AnalysisConfig::default();
        cfg.backtest.holding_days = 500;
        let err = analyze(&series(), &cfg, &AnalyzeOptions::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter(_)));
    }

    #[test]
    fn date_before_series_is_out_of_range() {
        let opts = AnalyzeOptions {
            at: NaiveDate::from_ymd_opt(2023, 12, 1),
            ..AnalyzeOptions::default()
        };
        let err = analyze(&series(), &AnalysisConfig::default(), &opts).unwrap_err();
        assert!(matches!(err, AnalysisError::DateOutOfRange { .. }));
    }

    #[test]
    fn recent_closes_are_capped() {
        let opts = AnalyzeOptions {
            recent_closes: 3,
            ..AnalyzeOptions::default()
        };
        let r = analyze(&series(), &AnalysisConfig::default(), &opts).unwrap();
        let closes: Vec<f64> = r.recent_closes.iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![10.1, 10.4, 10.6]);
    }

    #[test]
    fn zero_recent_closes_gives_empty_list() {
        let opts = AnalyzeOptions {
            recent_closes: 0,
            ..AnalyzeOptions::default()
        };
        let r = analyze(&series(), &AnalysisConfig::default(), &opts).unwrap();
        assert!(r.recent_closes.is_empty());
    }

    #[test]
    fn hash_depends_on_config_and_data() {
        let s = series();
        let cfg = AnalysisConfig::default();
        let mut other = cfg.clone();
        other.rsi_window = 6;
        assert_eq!(config_hash(&cfg, &s), config_hash(&cfg, &s));
        assert_ne!(config_hash(&cfg, &s), config_hash(&other, &s));
        assert_ne!(config_hash(&cfg, &s), config_hash(&cfg, &s.truncate_to(2)));
    }
}
