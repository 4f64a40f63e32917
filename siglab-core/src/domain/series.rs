//! Series: an ordered, validated run of bars for one symbol.
//!
//! A `Series` is built once per analysis request from whatever the data
//! provider returned and is never mutated afterwards. Indicator frames and
//! signal evaluations borrow it read-only.

use super::bar::Bar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a bar list cannot become a `Series`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("series for '{symbol}' is empty")]
    Empty { symbol: String },

    #[error("dates must be strictly ascending: bar {index} ({date}) does not follow {previous}")]
    UnorderedDates {
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },

    #[error("invalid bar {index} ({date}): {reason}")]
    InvalidBar {
        index: usize,
        date: NaiveDate,
        reason: String,
    },
}

/// Time-ordered OHLCV bars, indexed 0..n-1 by ascending unique date.
///
/// Invariants (checked by `Series::new`):
/// - at least one bar
/// - dates strictly ascending (no duplicates)
/// - OHLC finite, close > 0, volume finite and >= 0
///
/// Trading-calendar gaps are accepted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    symbol: String,
    bars: Vec<Bar>,
}

impl Series {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(SeriesError::Empty { symbol });
        }

        for (index, bar) in bars.iter().enumerate() {
            validate_bar(index, bar)?;
            if index > 0 {
                let previous = bars[index - 1].date;
                if bar.date <= previous {
                    return Err(SeriesError::UnorderedDates {
                        index,
                        date: bar.date,
                        previous,
                    });
                }
            }
        }

        Ok(Self { symbol, bars })
    }

    /// Sort by date, then validate. Duplicate dates are still rejected.
    pub fn from_unsorted(
        symbol: impl Into<String>,
        mut bars: Vec<Bar>,
    ) -> Result<Self, SeriesError> {
        bars.sort_by_key(|b| b.date);
        Self::new(symbol, bars)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a constructed series; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.bars.len() - 1
    }

    pub fn last(&self) -> &Bar {
        &self.bars[self.bars.len() - 1]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.last().date
    }

    /// Index of the last bar dated on or before `date`, if any.
    pub fn index_on_or_before(&self, date: NaiveDate) -> Option<usize> {
        match self.bars.binary_search_by_key(&date, |b| b.date) {
            Ok(i) => Some(i),
            Err(0) => None,
            Err(i) => Some(i - 1),
        }
    }

    /// A new series holding bars `0..=index`. Clamps to the last bar.
    ///
    /// Used to evaluate "as of" a past bar without any look-ahead.
    pub fn truncate_to(&self, index: usize) -> Series {
        let end = index.min(self.last_index());
        Series {
            symbol: self.symbol.clone(),
            bars: self.bars[..=end].to_vec(),
        }
    }

    /// The last `n` bars as a new series (the whole series if shorter).
    pub fn tail(&self, n: usize) -> Series {
        let n = n.max(1).min(self.bars.len());
        Series {
            symbol: self.symbol.clone(),
            bars: self.bars[self.bars.len() - n..].to_vec(),
        }
    }

    /// Bars dated within `start..=end` as a new series, or `None` if there are none.
    pub fn within(&self, start: NaiveDate, end: NaiveDate) -> Option<Series> {
        let bars: Vec<Bar> = self
            .bars
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect();
        if bars.is_empty() {
            return None;
        }
        Some(Series {
            symbol: self.symbol.clone(),
            bars,
        })
    }

    /// Indices of bars that fail `Bar::is_sane` (e.g. high below close).
    pub fn insane_bars(&self) -> Vec<usize> {
        self.bars
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.is_sane())
            .map(|(i, _)| i)
            .collect()
    }
}

fn validate_bar(index: usize, bar: &Bar) -> Result<(), SeriesError> {
    let invalid = |reason: &str| SeriesError::InvalidBar {
        index,
        date: bar.date,
        reason: reason.to_string(),
    };

    if !(bar.open.is_finite() && bar.high.is_finite() && bar.low.is_finite()) {
        return Err(invalid("non-finite open/high/low"));
    }
    if !bar.close.is_finite() || bar.close <= 0.0 {
        return Err(invalid("close must be a positive finite price"));
    }
    if !bar.volume.is_finite() || bar.volume < 0.0 {
        return Err(invalid("volume must be finite and non-negative"));
    }
    Ok(())
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) * 1.01, low = min(open,close) * 0.99, volume = 1000.
/// Dates are consecutive calendar days from 2024-01-02.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap_or(NaiveDate::MIN);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) * 1.01,
                low: open.min(close) * 0.99,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 500.0,
        }
    }

    #[test]
    fn rejects_empty() {
        let err = Series::new("600519", vec![]).unwrap_err();
        assert!(matches!(err, SeriesError::Empty { .. }));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = Series::new("600519", vec![bar(1, 10.0), bar(1, 11.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::UnorderedDates { index: 1, .. }));
    }

    #[test]
    fn rejects_descending_dates() {
        let err = Series::new("600519", vec![bar(2, 10.0), bar(1, 11.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::UnorderedDates { .. }));
    }

    #[test]
    fn from_unsorted_sorts_first() {
        let s = Series::from_unsorted("600519", vec![bar(3, 12.0), bar(1, 10.0), bar(2, 11.0)])
            .unwrap();
        assert_eq!(s.closes(), vec![10.0, 11.0, 12.0]);
    }

    #[test]
    fn rejects_zero_close() {
        let err = Series::new("600519", vec![bar(1, 10.0), bar(2, 0.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidBar { index: 1, .. }));
    }

    #[test]
    fn rejects_nan_volume() {
        let mut b = bar(1, 10.0);
        b.volume = f64::NAN;
        assert!(Series::new("600519", vec![b]).is_err());
    }

    #[test]
    fn accepts_insane_but_finite_bars() {
        let mut b = bar(1, 10.0);
        b.high = 9.0;
        let s = Series::new("600519", vec![b, bar(2, 10.0)]).unwrap();
        assert_eq!(s.insane_bars(), vec![0]);
    }

    #[test]
    fn index_on_or_before_handles_gaps() {
        let s = Series::new("000001", vec![bar(1, 10.0), bar(4, 11.0), bar(5, 12.0)]).unwrap();
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        assert_eq!(s.index_on_or_before(d(1)), Some(0));
        assert_eq!(s.index_on_or_before(d(3)), Some(0));
        assert_eq!(s.index_on_or_before(d(4)), Some(1));
        assert_eq!(s.index_on_or_before(d(30)), Some(2));
        assert_eq!(
            s.index_on_or_before(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
            None
        );
    }

    #[test]
    fn truncate_and_tail() {
        let s = Series::new("000001", bars_from_closes(&[1.0, 2.0, 3.0, 4.0])).unwrap();
        assert_eq!(s.truncate_to(1).closes(), vec![1.0, 2.0]);
        assert_eq!(s.truncate_to(99).len(), 4);
        assert_eq!(s.tail(2).closes(), vec![3.0, 4.0]);
        assert_eq!(s.tail(10).len(), 4);
    }

    #[test]
    fn within_keeps_inclusive_date_window() {
        let s = Series::new("000001", vec![bar(1, 10.0), bar(4, 11.0), bar(5, 12.0)]).unwrap();
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        assert_eq!(s.within(d(2), d(5)).unwrap().closes(), vec![11.0, 12.0]);
        assert_eq!(s.within(d(1), d(1)).unwrap().len(), 1);
        assert!(s.within(d(2), d(3)).is_none());
        assert!(s.within(d(5), d(1)).is_none());
    }
}
