//! Prior-window extrema of close.
//!
//! PriorExtreme(N, High)[t] = max(close[t-N ..= t-1])
//! PriorExtreme(N, Low)[t]  = min(close[t-N ..= t-1])
//!
//! The window stops at the bar before t, so a bar is never compared with a
//! baseline that contains itself. Lookback: N.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremeSide {
    High,
    Low,
}

#[derive(Debug, Clone)]
pub struct PriorExtreme {
    window: usize,
    side: ExtremeSide,
    name: String,
}

impl PriorExtreme {
    pub fn high(window: usize) -> Self {
        assert!(window >= 1, "extrema window must be >= 1");
        Self {
            window,
            side: ExtremeSide::High,
            name: format!("prior_high_{window}"),
        }
    }

    pub fn low(window: usize) -> Self {
        assert!(window >= 1, "extrema window must be >= 1");
        Self {
            window,
            side: ExtremeSide::Low,
            name: format!("prior_low_{window}"),
        }
    }
}

impl Indicator for PriorExtreme {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        for (t, slot) in result.iter_mut().enumerate().skip(self.window) {
            let window = &bars[(t - self.window)..t];
            *slot = match self.side {
                ExtremeSide::High => window.iter().map(|b| b.close).fold(f64::NEG_INFINITY, f64::max),
                ExtremeSide::Low => window.iter().map(|b| b.close).fold(f64::INFINITY, f64::min),
            };
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bars_from_closes;

    #[test]
    fn prior_high_excludes_today() {
        let bars = bars_from_closes(&[10.0, 12.0, 11.0, 15.0]);
        let result = PriorExtreme::high(2).compute(&bars);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        // [2] = max(10, 12)
        assert_eq!(result[2], 12.0);
        // [3] = max(12, 11), not 15
        assert_eq!(result[3], 12.0);
    }

    #[test]
    fn prior_low_excludes_today() {
        let bars = bars_from_closes(&[10.0, 12.0, 11.0, 5.0]);
        let result = PriorExtreme::low(3).compute(&bars);
        assert!(result[2].is_nan());
        assert_eq!(result[3], 10.0);
    }

    #[test]
    fn short_series_is_all_nan() {
        let bars = bars_from_closes(&[1.0; 20]);
        assert!(PriorExtreme::high(60).compute(&bars).iter().all(|v| v.is_nan()));
    }
}
