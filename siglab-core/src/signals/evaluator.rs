//! Current-bar evaluation of the fixed signal set.
//!
//! Every check compares "today" (bar `t`) against "yesterday" (bar `t-1`)
//! or against a precomputed prior-window baseline. A NaN or missing
//! operand yields `InsufficientData` for that signal only.

use super::cross::{crossed_above_strict, crossed_below_strict};
use super::{SignalKind, SignalReport, SignalStatus};
use crate::config::AnalysisConfig;
use crate::domain::Series;
use crate::indicators::IndicatorFrame;

struct Verdict {
    status: SignalStatus,
    explanation: String,
}

impl Verdict {
    fn decided(holds: bool, explanation: String) -> Self {
        let status = if holds {
            SignalStatus::Holds
        } else {
            SignalStatus::NotHeld
        };
        Self {
            status,
            explanation,
        }
    }

    fn insufficient(reason: impl Into<String>) -> Self {
        Self {
            status: SignalStatus::InsufficientData,
            explanation: reason.into(),
        }
    }
}

/// The fixed signal set for `cfg`, in report order.
pub fn signal_kinds(cfg: &AnalysisConfig) -> Vec<SignalKind> {
    let (fast, slow) = (cfg.ma_cross.fast, cfg.ma_cross.slow);
    vec![
        SignalKind::MaCrossAbove { fast, slow },
        SignalKind::MaCrossBelow { fast, slow },
        SignalKind::MacdBullishCross,
        SignalKind::MacdBearishCross,
        SignalKind::RsiOversoldBounce,
        SignalKind::RsiOverboughtPullback,
        SignalKind::VolumeBreakout,
        SignalKind::NDayHigh {
            n: cfg.extrema_window,
        },
        SignalKind::NDayLow {
            n: cfg.extrema_window,
        },
    ]
}

/// Evaluate every signal at the last bar of `series`.
pub fn evaluate_signals(
    series: &Series,
    frame: &IndicatorFrame,
    cfg: &AnalysisConfig,
) -> Vec<SignalReport> {
    evaluate_signals_at(series, frame, cfg, series.last_index())
}

/// Evaluate every signal with bar `index` as "today".
///
/// Never panics: an index past the end, or a frame shorter than the series,
/// turns into `InsufficientData` reports.
pub fn evaluate_signals_at(
    series: &Series,
    frame: &IndicatorFrame,
    cfg: &AnalysisConfig,
    index: usize,
) -> Vec<SignalReport> {
    let date = series.bars().get(index).map(|b| b.date);
    let reports: Vec<SignalReport> = signal_kinds(cfg)
        .into_iter()
        .map(|kind| {
            let verdict = if index >= series.len() || index >= frame.len() {
                Verdict::insufficient(format!(
                    "bar {index} is outside the series ({} bars)",
                    series.len()
                ))
            } else if index == 0 {
                Verdict::insufficient("needs at least 2 bars (no previous bar to compare against)")
            } else {
                evaluate_one(kind, series, frame, cfg, index)
            };
            SignalReport {
                kind,
                name: kind.name(),
                bar_index: index,
                date,
                status: verdict.status,
                explanation: verdict.explanation,
            }
        })
        .collect();

    tracing::debug!(
        symbol = series.symbol(),
        index,
        held = reports.iter().filter(|r| r.holds()).count(),
        "signals evaluated"
    );
    reports
}

/// Names of the signals that hold, in report order.
pub fn held_names(reports: &[SignalReport]) -> Vec<String> {
    reports
        .iter()
        .filter(|r| r.holds())
        .map(|r| r.name.clone())
        .collect()
}

fn evaluate_one(
    kind: SignalKind,
    series: &Series,
    frame: &IndicatorFrame,
    cfg: &AnalysisConfig,
    t: usize,
) -> Verdict {
    let th = &cfg.thresholds;
    match kind {
        SignalKind::MaCrossAbove { fast, slow } => {
            ma_cross(frame, fast, slow, t, CrossSide::Above)
        }
        SignalKind::MaCrossBelow { fast, slow } => {
            ma_cross(frame, fast, slow, t, CrossSide::Below)
        }
        SignalKind::MacdBullishCross => line_cross(
            "DIF",
            &frame.dif,
            "DEA",
            &frame.dea,
            t,
            CrossSide::Above,
        ),
        SignalKind::MacdBearishCross => line_cross(
            "DIF",
            &frame.dif,
            "DEA",
            &frame.dea,
            t,
            CrossSide::Below,
        ),
        SignalKind::RsiOversoldBounce => rsi_oversold_bounce(frame, th.rsi_oversold, t),
        SignalKind::RsiOverboughtPullback => rsi_overbought_pullback(frame, th.rsi_overbought, t),
        SignalKind::VolumeBreakout => volume_breakout(series, frame, cfg, t),
        SignalKind::NDayHigh { n } => n_day_extreme(series, &frame.prior_high, n, t, true),
        SignalKind::NDayLow { n } => n_day_extreme(series, &frame.prior_low, n, t, false),
    }
}

#[derive(Clone, Copy)]
enum CrossSide {
    Above,
    Below,
}

fn ma_cross(frame: &IndicatorFrame, fast: usize, slow: usize, t: usize, side: CrossSide) -> Verdict {
    let (Some(fast_col), Some(slow_col)) = (frame.ma(fast), frame.ma(slow)) else {
        return Verdict::insufficient(format!("MA{fast}/MA{slow} not computed for this frame"));
    };
    line_cross(
        &format!("MA{fast}"),
        fast_col,
        &format!("MA{slow}"),
        slow_col,
        t,
        side,
    )
}

fn line_cross(a_name: &str, a: &[f64], b_name: &str, b: &[f64], t: usize, side: CrossSide) -> Verdict {
    let y = t - 1;
    let values = [a.get(y), b.get(y), a.get(t), b.get(t)];
    let [Some(&pa), Some(&pb), Some(&ca), Some(&cb)] = values else {
        return Verdict::insufficient(format!("{a_name}/{b_name} missing at bar {t}"));
    };
    if !(pa.is_finite() && pb.is_finite() && ca.is_finite() && cb.is_finite()) {
        return Verdict::insufficient(format!(
            "{a_name}/{b_name} not yet defined (yesterday {} vs {}, today {} vs {})",
            num(pa),
            num(pb),
            num(ca),
            num(cb)
        ));
    }

    let (holds, verb, prev_op, cur_op) = match side {
        CrossSide::Above => (crossed_above_strict(pa, pb, ca, cb), "crossed above", "<", ">"),
        CrossSide::Below => (crossed_below_strict(pa, pb, ca, cb), "crossed below", ">", "<"),
    };
    let explanation = if holds {
        format!(
            "{a_name} {verb} {b_name}: yesterday {} {prev_op} {}, today {} {cur_op} {}",
            num(pa),
            num(pb),
            num(ca),
            num(cb)
        )
    } else {
        format!(
            "no cross: yesterday {a_name} {} vs {b_name} {}, today {a_name} {} vs {b_name} {}",
            num(pa),
            num(pb),
            num(ca),
            num(cb)
        )
    };
    Verdict::decided(holds, explanation)
}

fn rsi_pair(frame: &IndicatorFrame, t: usize) -> Result<(f64, f64), Verdict> {
    let prev = frame.rsi.get(t - 1).copied().unwrap_or(f64::NAN);
    let cur = frame.rsi.get(t).copied().unwrap_or(f64::NAN);
    if prev.is_finite() && cur.is_finite() {
        Ok((prev, cur))
    } else {
        Err(Verdict::insufficient(format!(
            "RSI{} needs {} prior changes (yesterday {}, today {})",
            frame.params().rsi_window,
            frame.params().rsi_window,
            num(prev),
            num(cur)
        )))
    }
}

fn rsi_oversold_bounce(frame: &IndicatorFrame, oversold: f64, t: usize) -> Verdict {
    let (prev, cur) = match rsi_pair(frame, t) {
        Ok(pair) => pair,
        Err(v) => return v,
    };
    let holds = prev < oversold && cur >= oversold;
    let explanation = if holds {
        format!(
            "RSI rebounded from oversold: yesterday {} < {}, today {} >= {}",
            num(prev),
            num(oversold),
            num(cur),
            num(oversold)
        )
    } else {
        format!(
            "no rebound through {}: RSI yesterday {}, today {}",
            num(oversold),
            num(prev),
            num(cur)
        )
    };
    Verdict::decided(holds, explanation)
}

fn rsi_overbought_pullback(frame: &IndicatorFrame, overbought: f64, t: usize) -> Verdict {
    let (prev, cur) = match rsi_pair(frame, t) {
        Ok(pair) => pair,
        Err(v) => return v,
    };
    let holds = prev > overbought && cur <= overbought;
    let explanation = if holds {
        format!(
            "RSI pulled back from overbought: yesterday {} > {}, today {} <= {}",
            num(prev),
            num(overbought),
            num(cur),
            num(overbought)
        )
    } else {
        format!(
            "no pullback through {}: RSI yesterday {}, today {}",
            num(overbought),
            num(prev),
            num(cur)
        )
    };
    Verdict::decided(holds, explanation)
}

/// Slack for the price leg: prices quoted in cents put an exact 2.00% move a
/// few ULPs either side of the floor.
const CHANGE_TOLERANCE: f64 = 1e-9;

fn volume_breakout(series: &Series, frame: &IndicatorFrame, cfg: &AnalysisConfig, t: usize) -> Verdict {
    let window = cfg.volume_window;
    let th = &cfg.thresholds;
    let bars = series.bars();
    let mean = frame.prior_volume_mean.get(t).copied().unwrap_or(f64::NAN);
    if !mean.is_finite() {
        return Verdict::insufficient(format!(
            "needs {window} prior bars of volume (have {t})"
        ));
    }

    let volume = bars[t].volume;
    let (prev_close, close) = (bars[t - 1].close, bars[t].close);
    let change = (close - prev_close) / prev_close;
    let bar_volume = th.volume_multiple * mean;

    let volume_ok = volume > bar_volume;
    let price_ok = change - th.price_change_floor > CHANGE_TOLERANCE;
    let explanation = format!(
        "volume {} {} {}x {window}-bar mean {} (= {}); close change {:+.2}% {} {:.2}%",
        num(volume),
        if volume_ok { ">" } else { "<=" },
        th.volume_multiple,
        num(mean),
        num(bar_volume),
        change * 100.0,
        if price_ok { ">" } else { "<=" },
        th.price_change_floor * 100.0
    );
    Verdict::decided(volume_ok && price_ok, explanation)
}

fn n_day_extreme(series: &Series, baseline: &[f64], n: usize, t: usize, high: bool) -> Verdict {
    let prior = baseline.get(t).copied().unwrap_or(f64::NAN);
    if !prior.is_finite() {
        return Verdict::insufficient(format!("needs {n} prior closes (have {t})"));
    }
    let close = series.bars()[t].close;
    let (holds, word, op, miss_op) = if high {
        (close >= prior, "high", ">=", "<")
    } else {
        (close <= prior, "low", "<=", ">")
    };
    let op = if holds { op } else { miss_op };
    Verdict::decided(
        holds,
        format!(
            "close {} {op} prior {n}-day {word} {}",
            num(close),
            num(prior)
        ),
    )
}

fn num(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.4}")
    } else {
        "n/a".to_string()
    }
}
