//! Synthetic A-share daily bars for demos and tests.
//!
//! Each symbol gets its own starting price, drift, volatility and typical
//! turnover, all drawn from a generator seeded with the BLAKE3 hash of the
//! symbol, so the same symbol and range always give the same bars.
//!
//! Moves respect the board's daily price limit (see [`price_limit`]) and
//! volume is quoted in whole lots of 100 shares, heavier on big-move days.
//! Weekends are skipped; exchange holidays are not modelled.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::{Bar, Series};

const LOT: f64 = 100.0;

/// Deterministic random-walk provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticProvider;

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        Ok(FetchResult {
            series: synthetic_series(symbol, start, end)?,
            source: DataSource::Synthetic,
        })
    }
}

/// Daily limit as a fraction of the previous close: ChiNext (`300xxx`,
/// `301xxx`) and STAR (`688xxx`) boards move 20%, everything else 10%.
pub fn price_limit(symbol: &str) -> f64 {
    if ["300", "301", "688"].iter().any(|p| symbol.starts_with(p)) {
        0.20
    } else {
        0.10
    }
}

/// Per-symbol character of the walk.
struct Profile {
    drift: f64,
    volatility: f64,
    base_lots: f64,
    limit: f64,
}

impl Profile {
    fn draw(symbol: &str, rng: &mut StdRng) -> Self {
        Self {
            drift: rng.gen_range(-0.0005..0.0008),
            volatility: rng.gen_range(0.012..0.03),
            base_lots: rng.gen_range(20_000.0..200_000.0),
            limit: price_limit(symbol),
        }
    }

    /// Close-to-close return, roughly bell-shaped, clamped to the limit.
    fn daily_return(&self, rng: &mut StdRng) -> f64 {
        let z: f64 = (0..3).map(|_| rng.gen_range(-1.0f64..1.0)).sum();
        (self.drift + self.volatility * z).clamp(-self.limit, self.limit)
    }
}

/// Random walk over the weekdays in `start..=end`.
pub fn synthetic_series(symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Series, DataError> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);
    let profile = Profile::draw(symbol, &mut rng);
    let mut prev_close: f64 = rng.gen_range(5.0..50.0);

    let trading_days = start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun));

    let mut bars = Vec::new();
    for date in trading_days {
        let upper = prev_close * (1.0 + profile.limit);
        let lower = prev_close * (1.0 - profile.limit);

        let ret = profile.daily_return(&mut rng);
        let close = prev_close * (1.0 + ret);
        let open = (prev_close * (1.0 + ret * rng.gen_range(0.0..0.5))).clamp(lower, upper);

        let wick = profile.volatility * 0.5;
        let high = (open.max(close) * (1.0 + rng.gen_range(0.0..wick))).min(upper);
        let low = (open.min(close) * (1.0 - rng.gen_range(0.0..wick))).max(lower);

        let activity = 0.6 + 2.0 * ret.abs() / profile.limit + rng.gen_range(0.0..0.8);
        let volume = (profile.base_lots * activity).round() * LOT;

        bars.push(Bar {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
        prev_close = close;
    }

    if bars.is_empty() {
        return Err(DataError::NoBarsInRange {
            symbol: symbol.to_string(),
            start,
            end,
        });
    }
    Ok(Series::new(symbol, bars)?)
}
