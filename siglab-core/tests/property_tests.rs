//! Property tests for indicator, signal and backtest invariants.
//!
//! Uses proptest to verify:
//! 1. Idempotence: recomputing the frame and signals gives identical output
//! 2. No look-ahead: a prefix's frame equals the full frame's prefix
//! 3. Monotone closes: N-day high always holds once N bars exist, N-day low never
//! 4. Backtest summaries: win rate in [0, 1], counts add up, no NaN

use proptest::prelude::*;
use siglab_core::backtest::run_backtest;
use siglab_core::domain::{bars_from_closes, Series};
use siglab_core::indicators::IndicatorFrame;
use siglab_core::signals::{evaluate_signals, evaluate_signals_at};
use siglab_core::{AnalysisConfig, BacktestParams, BacktestSignal};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((1.0..100.0_f64).prop_map(|p| (p * 100.0).round() / 100.0), 1..max_len)
}

fn arb_increments() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01..2.0_f64, 1..80)
}

fn series(closes: &[f64]) -> Series {
    Series::new("PROP", bars_from_closes(closes)).unwrap()
}

/// Bitwise column equality (NaN == NaN).
fn same_bits(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}

// ── 1. Idempotence ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn frame_and_signals_are_idempotent(closes in arb_closes(120)) {
        let s = series(&closes);
        let cfg = AnalysisConfig::default();
        let f1 = IndicatorFrame::compute(&s, &cfg.indicator_params());
        let f2 = IndicatorFrame::compute(&s, &cfg.indicator_params());
        prop_assert!(same_bits(&f1.dif, &f2.dif));
        prop_assert!(same_bits(&f1.rsi, &f2.rsi));
        prop_assert_eq!(evaluate_signals(&s, &f1, &cfg), evaluate_signals(&s, &f2, &cfg));
    }
}

// ── 2. No look-ahead ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn prefix_frame_matches_full_frame(closes in arb_closes(100), cut in 0usize..100) {
        let s = series(&closes);
        let cut = cut % s.len();
        let cfg = AnalysisConfig::default();
        let full = IndicatorFrame::compute(&s, &cfg.indicator_params());
        let prefix = s.truncate_to(cut);
        let part = IndicatorFrame::compute(&prefix, &cfg.indicator_params());
        let n = cut + 1;

        for (w, column) in &part.ma {
            prop_assert!(same_bits(column, &full.ma[w][..n]), "MA{}", w);
        }
        prop_assert!(same_bits(&part.dif, &full.dif[..n]));
        prop_assert!(same_bits(&part.dea, &full.dea[..n]));
        prop_assert!(same_bits(&part.macd_hist, &full.macd_hist[..n]));
        prop_assert!(same_bits(&part.rsi, &full.rsi[..n]));
        prop_assert!(same_bits(&part.prior_high, &full.prior_high[..n]));
        prop_assert!(same_bits(&part.prior_volume_mean, &full.prior_volume_mean[..n]));

        prop_assert_eq!(
            evaluate_signals(&prefix, &part, &cfg),
            evaluate_signals_at(&s, &full, &cfg, cut)
        );
    }
}

// ── 3. Monotone closes ───────────────────────────────────────────────

proptest! {
    #[test]
    fn rising_closes_always_at_n_day_high(steps in arb_increments(), n in 1usize..15) {
        let mut price = 5.0;
        let closes: Vec<f64> = steps.iter().map(|d| { price += d; price }).collect();
        let s = series(&closes);
        let cfg = AnalysisConfig { extrema_window: n, ..AnalysisConfig::default() };
        let f = IndicatorFrame::compute(&s, &cfg.indicator_params());
        let high = format!("{n}_day_high");
        let low = format!("{n}_day_low");

        for index in n..s.len() {
            let reports = evaluate_signals_at(&s, &f, &cfg, index);
            for r in &reports {
                if r.name == high {
                    prop_assert!(r.holds(), "bar {}: {}", index, r.explanation);
                }
                if r.name == low {
                    prop_assert!(!r.holds(), "bar {}: {}", index, r.explanation);
                }
            }
        }
    }
}

// ── 4. Backtest summaries ────────────────────────────────────────────

proptest! {
    #[test]
    fn backtest_rates_are_bounded(
        closes in arb_closes(200),
        holding in 1usize..10,
        use_ma in any::<bool>(),
    ) {
        let s = series(&closes);
        let cfg = AnalysisConfig::default();
        let f = IndicatorFrame::compute(&s, &cfg.indicator_params());
        let params = BacktestParams {
            signal: if use_ma {
                BacktestSignal::MaCross { fast: 5, slow: 10 }
            } else {
                BacktestSignal::MacdCross
            },
            lookback: 120,
            holding_days: holding,
        };
        let report = run_backtest(&s, &f, &params);

        prop_assert_eq!(report.summary.len(), 2);
        let mut total = 0;
        for summary in report.summary.values() {
            prop_assert!((0.0..=1.0).contains(&summary.win_rate));
            prop_assert!(summary.mean_return.is_finite());
            prop_assert!(summary.wins <= summary.occurrence_count);
            total += summary.occurrence_count;
        }
        prop_assert_eq!(total, report.trades.len());
        for t in &report.trades {
            prop_assert!(t.ret.is_finite());
            prop_assert_eq!(t.exit_index - t.entry_index, holding);
        }
    }
}
