//! Mean volume over the bars before each bar.
//!
//! PriorVolumeMean(N)[t] = mean(volume[t-N ..= t-1]). Lookback: N.

use super::{rolling_mean, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct PriorVolumeMean {
    window: usize,
    name: String,
}

impl PriorVolumeMean {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "volume window must be >= 1");
        Self {
            window,
            name: format!("prior_volume_mean_{window}"),
        }
    }
}

impl Indicator for PriorVolumeMean {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
        let trailing = rolling_mean(&volumes, self.window);

        // Shift by one: the mean ending at t-1 belongs to bar t.
        let mut result = vec![f64::NAN; n];
        for t in 1..n {
            result[t] = trailing[t - 1];
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bars_from_closes;

    #[test]
    fn excludes_current_bar() {
        let mut bars = bars_from_closes(&[1.0; 7]);
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.volume = (i as f64 + 1.0) * 100.0;
        }
        let result = PriorVolumeMean::new(5).compute(&bars);
        for v in result.iter().take(5) {
            assert!(v.is_nan());
        }
        // [5] = mean(100..=500) = 300
        assert_eq!(result[5], 300.0);
        // [6] = mean(200..=600) = 400
        assert_eq!(result[6], 400.0);
    }
}
