//! Crossover scan over the usable tail of an indicator frame.
//!
//! Usable bars are those where every required column (all MAs, RSI, DIF,
//! DEA) is defined; the trailing `lookback` of them form the scan window.
//! Each crossover inside the window is one trade: entry at the trigger
//! close, exit `holding_days` usable bars later. Overlapping trades are kept.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::summary::{summarize, KindSummary};
use crate::config::{BacktestParams, BacktestSignal};
use crate::domain::{CrossDirection, Series, TradeRecord};
use crate::indicators::IndicatorFrame;
use crate::signals::{crossed_above, crossed_below};

/// Result of one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub signal: BacktestSignal,
    pub lookback: usize,
    pub holding_days: usize,
    /// Bars in the scan window after dropping incomplete rows.
    pub usable_bars: usize,
    pub trades: Vec<TradeRecord>,
    pub summary: BTreeMap<CrossDirection, KindSummary>,
    /// Triggers whose entry price was not a positive finite number.
    pub skipped_triggers: usize,
}

impl BacktestReport {
    fn empty(params: &BacktestParams, usable_bars: usize) -> Self {
        Self {
            signal: params.signal,
            lookback: params.lookback,
            holding_days: params.holding_days,
            usable_bars,
            trades: Vec::new(),
            summary: summarize(&[]),
            skipped_triggers: 0,
        }
    }

    pub fn summary_for(&self, direction: CrossDirection) -> KindSummary {
        self.summary.get(&direction).copied().unwrap_or_default()
    }

    pub fn trades_of(&self, direction: CrossDirection) -> impl Iterator<Item = &TradeRecord> {
        self.trades.iter().filter(move |t| t.signal_kind == direction)
    }
}

/// Global indices of the bars kept for the scan: complete rows only, the
/// last `lookback` of them.
pub fn usable_indices(frame: &IndicatorFrame, lookback: usize) -> Vec<usize> {
    let complete: Vec<usize> = (0..frame.len()).filter(|&i| frame.is_complete_at(i)).collect();
    let start = complete.len().saturating_sub(lookback);
    complete[start..].to_vec()
}

/// Scan for crossovers and measure forward returns.
///
/// Data shortfalls produce an empty report, never an error. Parameters are
/// assumed validated by `BacktestParams::validate`.
pub fn run_backtest(series: &Series, frame: &IndicatorFrame, params: &BacktestParams) -> BacktestReport {
    let (a, b) = match lines(frame, params.signal) {
        Some(pair) => pair,
        None => {
            tracing::warn!(
                symbol = series.symbol(),
                signal = %params.signal.label(),
                "crossover columns not in frame; backtest skipped"
            );
            return BacktestReport::empty(params, 0);
        }
    };

    let usable = usable_indices(frame, params.lookback);
    let len = usable.len();
    if params.holding_days == 0 || len < params.holding_days.saturating_add(2) {
        tracing::debug!(
            symbol = series.symbol(),
            usable = len,
            holding_days = params.holding_days,
            "not enough usable bars for a backtest"
        );
        return BacktestReport::empty(params, len);
    }

    let bars = series.bars();
    let mut trades = Vec::new();
    let mut skipped = 0;

    for i in 1..(len - params.holding_days) {
        let (prev, cur) = (usable[i - 1], usable[i]);
        let direction = if crossed_above(a[prev], b[prev], a[cur], b[cur]) {
            CrossDirection::Bullish
        } else if crossed_below(a[prev], b[prev], a[cur], b[cur]) {
            CrossDirection::Bearish
        } else {
            continue;
        };

        let exit = usable[i + params.holding_days];
        let (entry_bar, exit_bar) = (&bars[cur], &bars[exit]);
        if !(entry_bar.close.is_finite() && entry_bar.close > 0.0) {
            tracing::warn!(
                symbol = series.symbol(),
                date = %entry_bar.date,
                close = entry_bar.close,
                "trigger skipped: entry price not positive"
            );
            skipped += 1;
            continue;
        }

        let ret = (exit_bar.close - entry_bar.close) / entry_bar.close;
        trades.push(TradeRecord {
            signal_kind: direction,
            entry_index: cur,
            entry_date: entry_bar.date,
            entry_price: entry_bar.close,
            exit_index: exit,
            exit_date: exit_bar.date,
            exit_price: exit_bar.close,
            ret,
            win: direction.is_win(ret),
        });
    }

    let summary = summarize(&trades);
    tracing::info!(
        symbol = series.symbol(),
        signal = %params.signal.label(),
        usable = len,
        trades = trades.len(),
        bullish_win_rate = summary[&CrossDirection::Bullish].win_rate,
        bearish_win_rate = summary[&CrossDirection::Bearish].win_rate,
        "backtest complete"
    );

    BacktestReport {
        signal: params.signal,
        lookback: params.lookback,
        holding_days: params.holding_days,
        usable_bars: len,
        trades,
        summary,
        skipped_triggers: skipped,
    }
}

fn lines(frame: &IndicatorFrame, signal: BacktestSignal) -> Option<(&[f64], &[f64])> {
    match signal {
        BacktestSignal::MacdCross => Some((&frame.dif, &frame.dea)),
        BacktestSignal::MaCross { fast, slow } => Some((frame.ma(fast)?, frame.ma(slow)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::domain::bars_from_closes;

    fn frame_for(closes: &[f64]) -> (Series, IndicatorFrame) {
        let s = Series::new("600036", bars_from_closes(closes)).unwrap();
        let f = IndicatorFrame::compute(&s, &AnalysisConfig::default().indicator_params());
        (s, f)
    }

    #[test]
    fn short_series_gives_empty_report() {
        let (s, f) = frame_for(&[10.0; 15]);
        let r = run_backtest(&s, &f, &BacktestParams::default());
        assert!(r.trades.is_empty());
        assert_eq!(r.usable_bars, 0);
        assert_eq!(r.summary_for(CrossDirection::Bullish).occurrence_count, 0);
        assert_eq!(r.summary_for(CrossDirection::Bearish).win_rate, 0.0);
    }

    #[test]
    fn missing_ma_column_gives_empty_report() {
        let (s, f) = frame_for(&[10.0; 40]);
        let params = BacktestParams {
            signal: BacktestSignal::MaCross { fast: 3, slow: 7 },
            ..BacktestParams::default()
        };
        let r = run_backtest(&s, &f, &params);
        assert!(r.trades.is_empty());
        assert_eq!(r.summary.len(), 2);
    }

    #[test]
    fn usable_indices_drop_warmup_and_keep_tail() {
        let (_, f) = frame_for(&(0..40).map(|i| 10.0 + (i % 4) as f64).collect::<Vec<_>>());
        // MA20 is the last column to become defined, at index 19
        let all = usable_indices(&f, 1000);
        assert_eq!(all.first(), Some(&19));
        assert_eq!(all.len(), 21);
        let tail = usable_indices(&f, 5);
        assert_eq!(tail, vec![35, 36, 37, 38, 39]);
    }

    #[test]
    fn huge_holding_period_gives_empty_report() {
        let (s, f) = frame_for(&[10.0; 40]);
        let params = BacktestParams {
            signal: BacktestSignal::MacdCross,
            lookback: usize::MAX,
            holding_days: usize::MAX - 1,
        };
        assert_eq!(params.validate(), Ok(()));
        let r = run_backtest(&s, &f, &params);
        assert!(r.trades.is_empty());
        assert_eq!(r.usable_bars, 21);
    }

    #[test]
    fn flat_series_has_no_trades() {
        let (s, f) = frame_for(&[10.0; 60]);
        let r = run_backtest(&s, &f, &BacktestParams::default());
        assert!(r.trades.is_empty());
        assert_eq!(r.usable_bars, 41);
    }
}
