//! Signal evaluation: named boolean facts about one bar.
//!
//! Signals read the series and its precomputed frame, nothing else. A
//! report is produced fresh on every evaluation and carries no identity
//! beyond its kind and the bar it was evaluated at.

pub mod cross;
pub mod evaluator;

pub use cross::{crossed_above, crossed_above_strict, crossed_below, crossed_below_strict};
pub use evaluator::{evaluate_signals, evaluate_signals_at, held_names, signal_kinds};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed signal set, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalKind {
    MaCrossAbove { fast: usize, slow: usize },
    MaCrossBelow { fast: usize, slow: usize },
    MacdBullishCross,
    MacdBearishCross,
    RsiOversoldBounce,
    RsiOverboughtPullback,
    VolumeBreakout,
    NDayHigh { n: usize },
    NDayLow { n: usize },
}

impl SignalKind {
    /// Stable machine name, e.g. `MA5_cross_above_MA10` or `60_day_high`.
    pub fn name(&self) -> String {
        match self {
            SignalKind::MaCrossAbove { fast, slow } => format!("MA{fast}_cross_above_MA{slow}"),
            SignalKind::MaCrossBelow { fast, slow } => format!("MA{fast}_cross_below_MA{slow}"),
            SignalKind::MacdBullishCross => "MACD_bullish_cross".into(),
            SignalKind::MacdBearishCross => "MACD_bearish_cross".into(),
            SignalKind::RsiOversoldBounce => "RSI_oversold_bounce".into(),
            SignalKind::RsiOverboughtPullback => "RSI_overbought_pullback".into(),
            SignalKind::VolumeBreakout => "volume_breakout".into(),
            SignalKind::NDayHigh { n } => format!("{n}_day_high"),
            SignalKind::NDayLow { n } => format!("{n}_day_low"),
        }
    }

    /// Short label used in prompts and tables. The golden/death cross terms
    /// are the ones A-share readers expect.
    pub fn label(&self) -> String {
        match self {
            SignalKind::MaCrossAbove { fast, slow } => format!("MA{fast}/MA{slow} golden cross"),
            SignalKind::MaCrossBelow { fast, slow } => format!("MA{fast}/MA{slow} death cross"),
            SignalKind::MacdBullishCross => "MACD golden cross".into(),
            SignalKind::MacdBearishCross => "MACD death cross".into(),
            SignalKind::RsiOversoldBounce => "RSI oversold rebound".into(),
            SignalKind::RsiOverboughtPullback => "RSI overbought pullback".into(),
            SignalKind::VolumeBreakout => "volume breakout".into(),
            SignalKind::NDayHigh { n } => format!("{n}-day high"),
            SignalKind::NDayLow { n } => format!("{n}-day low"),
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Outcome of one signal at one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    Holds,
    NotHeld,
    /// A compared value was missing (too little history, or index out of range).
    InsufficientData,
}

/// One evaluated signal with a human-readable justification.
///
/// The explanation quotes the values that were actually compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReport {
    pub kind: SignalKind,
    pub name: String,
    pub bar_index: usize,
    pub date: Option<NaiveDate>,
    pub status: SignalStatus,
    pub explanation: String,
}

impl SignalReport {
    pub fn holds(&self) -> bool {
        self.status == SignalStatus::Holds
    }

    pub fn is_insufficient(&self) -> bool {
        self.status == SignalStatus::InsufficientData
    }
}
