//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1],
//! alpha = 2 / (span + 1).
//! Seed: EMA[0] = close[0]. The series is defined from the first bar, which
//! is what A-share charting packages show for MACD; there is no SMA warmup.
//! Lookback: 0.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    name: String,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            name: format!("ema_{span}"),
        }
    }

    pub fn alpha(&self) -> f64 {
        2.0 / (self.span as f64 + 1.0)
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        ema_of_series(&closes, self.span)
    }
}

/// Compute EMA values from a pre-extracted f64 slice, seeded with the first
/// value. Used by MACD for both the price EMAs and the DEA line.
///
/// Leading NaNs are skipped: the seed is the first finite value. A NaN after
/// the seed taints every later output.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if span == 0 {
        return result;
    }

    let Some(start) = values.iter().position(|v| v.is_finite()) else {
        return result;
    };

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev = values[start];
    result[start] = prev;

    for i in (start + 1)..n {
        if !values[i].is_finite() {
            return result;
        }
        let ema = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = ema;
        prev = ema;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bars_from_closes;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn ema_span_1_equals_close() {
        let bars = bars_from_closes(&[100.0, 200.0, 300.0]);
        let result = Ema::new(1).compute(&bars);
        assert_eq!(result, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn ema_3_known_values() {
        // alpha = 2/(3+1) = 0.5
        // EMA[0] = 10
        // EMA[1] = 0.5*11 + 0.5*10 = 10.5
        // EMA[2] = 0.5*12 + 0.5*10.5 = 11.25
        // EMA[3] = 0.5*13 + 0.5*11.25 = 12.125
        let bars = bars_from_closes(&[10.0, 11.0, 12.0, 13.0]);
        let result = Ema::new(3).compute(&bars);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 10.5, DEFAULT_EPSILON);
        assert_approx(result[2], 11.25, DEFAULT_EPSILON);
        assert_approx(result[3], 12.125, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_defined_on_single_bar() {
        let bars = bars_from_closes(&[42.0]);
        assert_eq!(Ema::new(26).compute(&bars), vec![42.0]);
    }

    #[test]
    fn ema_of_series_skips_leading_nan() {
        let result = ema_of_series(&[f64::NAN, f64::NAN, 4.0, 6.0], 3);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 4.0, DEFAULT_EPSILON);
        assert_approx(result[3], 5.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_of_series_nan_after_seed_propagates() {
        let result = ema_of_series(&[1.0, 2.0, f64::NAN, 4.0], 3);
        assert!(!result[1].is_nan());
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
    }

    #[test]
    fn flat_input_stays_flat() {
        let result = ema_of_series(&[7.0; 50], 12);
        assert!(result.iter().all(|&v| v == 7.0));
    }
}
