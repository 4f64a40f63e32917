//! TradeRecord: one historical crossover occurrence and its forward return.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a crossover event.
///
/// Bullish crossovers anticipate a rise, bearish ones a fall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossDirection {
    Bullish,
    Bearish,
}

impl CrossDirection {
    pub const ALL: [CrossDirection; 2] = [CrossDirection::Bullish, CrossDirection::Bearish];

    pub fn label(&self) -> &'static str {
        match self {
            CrossDirection::Bullish => "bullish crossover",
            CrossDirection::Bearish => "bearish crossover",
        }
    }

    /// Whether a forward return counts as a win for this direction.
    ///
    /// A zero return is never a win in either direction.
    pub fn is_win(&self, ret: f64) -> bool {
        match self {
            CrossDirection::Bullish => ret > 0.0,
            CrossDirection::Bearish => ret < 0.0,
        }
    }
}

impl fmt::Display for CrossDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A crossover trigger with entry at the trigger bar close and exit
/// `holding_days` bars later.
///
/// Records are independent: a trigger while an earlier one is still inside
/// its holding window is recorded as its own trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub signal_kind: CrossDirection,

    // ── Entry ──
    /// Index into the full series the backtest was run on.
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_index: usize,
    pub exit_date: NaiveDate,
    pub exit_price: f64,

    /// (exit - entry) / entry, as a fraction.
    pub ret: f64,
    pub win: bool,
}

impl TradeRecord {
    /// Return as a percentage string with two decimals, e.g. `"5.00%"`.
    pub fn return_pct_display(&self) -> String {
        format!("{:.2}%", self.ret * 100.0)
    }

    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }
}
