//! MACD: DIF, DEA and histogram.
//!
//! DIF = EMA_fast(close) - EMA_slow(close)
//! DEA = EMA_signal(DIF)
//! HIST = MACD_HIST_SCALE * (DIF - DEA)
//!
//! All three lines use first-value seeded EMAs, so they are defined from bar 0.

use super::ema::ema_of_series;
use serde::{Deserialize, Serialize};

/// Histogram scale. A-share terminals plot 2 × (DIF − DEA); other markets
/// often plot the raw difference.
pub const MACD_HIST_SCALE: f64 = 2.0;

/// EMA spans for MACD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

/// The five MACD-related columns, each the length of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
    pub dif: Vec<f64>,
    pub dea: Vec<f64>,
    pub hist: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct Macd {
    params: MacdParams,
}

impl Macd {
    pub fn new(params: MacdParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> MacdParams {
        self.params
    }

    pub fn compute(&self, closes: &[f64]) -> MacdSeries {
        let ema_fast = ema_of_series(closes, self.params.fast);
        let ema_slow = ema_of_series(closes, self.params.slow);
        let dif: Vec<f64> = ema_fast
            .iter()
            .zip(&ema_slow)
            .map(|(f, s)| f - s)
            .collect();
        let dea = ema_of_series(&dif, self.params.signal);
        let hist = dif
            .iter()
            .zip(&dea)
            .map(|(d, e)| MACD_HIST_SCALE * (d - e))
            .collect();

        MacdSeries {
            ema_fast,
            ema_slow,
            dif,
            dea,
            hist,
        }
    }
}
