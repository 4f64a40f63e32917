//! Indicator Engine.
//!
//! Indicators are pure functions: bar history in, numeric series out. Every
//! output has the same length as the input, with `f64::NAN` wherever the
//! history is too short. They are computed once per request and assembled
//! into an [`IndicatorFrame`] with a fixed, named schema.

pub mod ema;
pub mod extrema;
pub mod frame;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod volume;

pub use ema::{ema_of_series, Ema};
pub use extrema::{ExtremeSide, PriorExtreme};
pub use frame::{IndicatorFrame, IndicatorParams, IndicatorSnapshot, FRAME_SCHEMA_VERSION};
pub use macd::{Macd, MacdParams, MacdSeries, MACD_HIST_SCALE};
pub use rsi::Rsi;
pub use sma::{rolling_mean, Sma};
pub use volume::PriorVolumeMean;

use crate::domain::Bar;

/// Trait for single-series indicators.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading bars that are NaN before the first valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
