//! Indicator Frame: the Series plus every derived column, under a fixed schema.
//!
//! Downstream code reads named fields (`frame.dif`, `frame.ma(5)`), never
//! looks a column up by a guessed string. The frame is built once per request
//! as a new value; the input series is only borrowed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Indicator, Macd, MacdParams, PriorExtreme, PriorVolumeMean, Rsi, Sma};
use crate::domain::Series;

/// Bumped whenever a column is added, removed, or changes meaning.
pub const FRAME_SCHEMA_VERSION: u32 = 1;

/// Window lengths and spans the frame is computed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub ma_windows: Vec<usize>,
    pub rsi_window: usize,
    pub macd: MacdParams,
    pub extrema_window: usize,
    pub volume_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ma_windows: vec![5, 10, 20],
            rsi_window: 14,
            macd: MacdParams::default(),
            extrema_window: 60,
            volume_window: 5,
        }
    }
}

/// All derived columns for one series. Every column has `len()` entries and
/// holds `f64::NAN` where history is insufficient.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    params: IndicatorParams,
    len: usize,

    /// Simple moving averages of close, keyed by window.
    pub ma: BTreeMap<usize, Vec<f64>>,
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
    pub dif: Vec<f64>,
    pub dea: Vec<f64>,
    pub macd_hist: Vec<f64>,
    pub rsi: Vec<f64>,
    /// Max close over the `extrema_window` bars before each bar.
    pub prior_high: Vec<f64>,
    /// Min close over the `extrema_window` bars before each bar.
    pub prior_low: Vec<f64>,
    /// Mean volume over the `volume_window` bars before each bar.
    pub prior_volume_mean: Vec<f64>,
}

impl IndicatorFrame {
    /// Compute every column. Windows of zero are treated as "not computable"
    /// and yield all-NaN columns; parameter validation happens upstream in
    /// `AnalysisConfig::validate`.
    pub fn compute(series: &Series, params: &IndicatorParams) -> Self {
        let bars = series.bars();
        let n = bars.len();
        let nan_column = || vec![f64::NAN; n];

        let mut ma = BTreeMap::new();
        for &window in &params.ma_windows {
            let column = if window == 0 {
                nan_column()
            } else {
                Sma::new(window).compute(bars)
            };
            ma.insert(window, column);
        }

        let macd = Macd::new(params.macd).compute(&series.closes());

        let rsi = if params.rsi_window == 0 {
            nan_column()
        } else {
            Rsi::new(params.rsi_window).compute(bars)
        };

        let (prior_high, prior_low) = if params.extrema_window == 0 {
            (nan_column(), nan_column())
        } else {
            (
                PriorExtreme::high(params.extrema_window).compute(bars),
                PriorExtreme::low(params.extrema_window).compute(bars),
            )
        };

        let prior_volume_mean = if params.volume_window == 0 {
            nan_column()
        } else {
            PriorVolumeMean::new(params.volume_window).compute(bars)
        };

        tracing::debug!(
            symbol = series.symbol(),
            bars = n,
            ma_windows = ?params.ma_windows,
            "indicator frame computed"
        );

        Self {
            params: params.clone(),
            len: n,
            ma,
            ema_fast: macd.ema_fast,
            ema_slow: macd.ema_slow,
            dif: macd.dif,
            dea: macd.dea,
            macd_hist: macd.hist,
            rsi,
            prior_high,
            prior_low,
            prior_volume_mean,
        }
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The MA column for `window`, if that window was configured.
    pub fn ma(&self, window: usize) -> Option<&[f64]> {
        self.ma.get(&window).map(|v| v.as_slice())
    }

    /// Columns whose NaN-ness disqualifies a bar from the backtest window:
    /// every MA, RSI, DIF and DEA. Prior extrema and volume means are excluded.
    pub fn required_columns(&self) -> Vec<&[f64]> {
        let mut columns: Vec<&[f64]> = self.ma.values().map(|v| v.as_slice()).collect();
        columns.push(&self.rsi);
        columns.push(&self.dif);
        columns.push(&self.dea);
        columns
    }

    /// True if every required column has a finite value at `index`.
    pub fn is_complete_at(&self, index: usize) -> bool {
        index < self.len
            && self
                .required_columns()
                .iter()
                .all(|column| column[index].is_finite())
    }

    /// Named values at one bar, with NaN mapped to `None`.
    pub fn snapshot(&self, index: usize) -> IndicatorSnapshot {
        let at = |column: &[f64]| column.get(index).copied().filter(|v| v.is_finite());
        IndicatorSnapshot {
            index,
            ma: self.ma.iter().map(|(&w, column)| (w, at(column))).collect(),
            dif: at(&self.dif),
            dea: at(&self.dea),
            macd_hist: at(&self.macd_hist),
            rsi: at(&self.rsi),
            prior_high: at(&self.prior_high),
            prior_low: at(&self.prior_low),
            prior_volume_mean: at(&self.prior_volume_mean),
        }
    }
}

/// Serializable view of the frame at one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub index: usize,
    pub ma: BTreeMap<usize, Option<f64>>,
    pub dif: Option<f64>,
    pub dea: Option<f64>,
    pub macd_hist: Option<f64>,
    pub rsi: Option<f64>,
    pub prior_high: Option<f64>,
    pub prior_low: Option<f64>,
    pub prior_volume_mean: Option<f64>,
}
