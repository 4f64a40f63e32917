//! Win-rate statistics: pure functions over a trade list.
//!
//! Counts of zero always produce 0.0 rates, never NaN.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{CrossDirection, TradeRecord};

/// Aggregate outcome of one crossover direction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KindSummary {
    pub occurrence_count: usize,
    pub wins: usize,
    /// wins / occurrence_count, in [0, 1].
    pub win_rate: f64,
    pub mean_return: f64,
}

impl KindSummary {
    pub fn from_trades<'a>(trades: impl IntoIterator<Item = &'a TradeRecord>) -> Self {
        let trades: Vec<&TradeRecord> = trades.into_iter().collect();
        Self {
            occurrence_count: trades.len(),
            wins: trades.iter().filter(|t| t.win).count(),
            win_rate: win_rate(trades.iter().copied()),
            mean_return: mean_return(trades.iter().copied()),
        }
    }

    pub fn win_rate_pct(&self) -> String {
        format!("{:.2}%", self.win_rate * 100.0)
    }
}

/// One entry per direction, both always present.
pub fn summarize(trades: &[TradeRecord]) -> BTreeMap<CrossDirection, KindSummary> {
    CrossDirection::ALL
        .iter()
        .map(|&dir| {
            let summary = KindSummary::from_trades(trades.iter().filter(|t| t.signal_kind == dir));
            (dir, summary)
        })
        .collect()
}

/// Fraction of winning trades. 0.0 for an empty list.
pub fn win_rate<'a>(trades: impl IntoIterator<Item = &'a TradeRecord>) -> f64 {
    let (wins, total) = trades
        .into_iter()
        .fold((0usize, 0usize), |(w, n), t| (w + usize::from(t.win), n + 1));
    if total == 0 {
        return 0.0;
    }
    wins as f64 / total as f64
}

/// Arithmetic mean of `ret`. 0.0 for an empty list.
pub fn mean_return<'a>(trades: impl IntoIterator<Item = &'a TradeRecord>) -> f64 {
    let (sum, total) = trades
        .into_iter()
        .fold((0.0, 0usize), |(s, n), t| (s + t.ret, n + 1));
    if total == 0 {
        return 0.0;
    }
    sum / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn trade(dir: CrossDirection, ret: f64) -> TradeRecord {
        let d = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        TradeRecord {
            signal_kind: dir,
            entry_index: 0,
            entry_date: d,
            entry_price: 10.0,
            exit_index: 5,
            exit_date: d,
            exit_price: 10.0 * (1.0 + ret),
            ret,
            win: dir.is_win(ret),
        }
    }

    #[test]
    fn win_rate_arithmetic() {
        let trades = vec![
            trade(CrossDirection::Bullish, 0.05),
            trade(CrossDirection::Bullish, -0.02),
            trade(CrossDirection::Bullish, 0.01),
        ];
        let summary = summarize(&trades);
        let bull = summary[&CrossDirection::Bullish];
        assert_eq!(bull.occurrence_count, 3);
        assert_eq!(bull.wins, 2);
        assert!((bull.win_rate - 2.0 / 3.0).abs() < 1e-12);
        assert!((bull.mean_return - 0.04 / 3.0).abs() < 1e-12);
        assert_eq!(bull.win_rate_pct(), "66.67%");
    }

    #[test]
    fn empty_is_zero_not_nan() {
        let summary = summarize(&[]);
        assert_eq!(summary.len(), 2);
        for s in summary.values() {
            assert_eq!(s.occurrence_count, 0);
            assert_eq!(s.win_rate, 0.0);
            assert_eq!(s.mean_return, 0.0);
        }
    }

    #[test]
    fn bearish_wins_on_decline() {
        let trades = vec![
            trade(CrossDirection::Bearish, -0.03),
            trade(CrossDirection::Bearish, 0.0),
        ];
        let s = summarize(&trades)[&CrossDirection::Bearish];
        assert_eq!(s.wins, 1);
        assert_eq!(s.win_rate, 0.5);
    }
}
