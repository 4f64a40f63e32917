//! Pairwise crossover tests between two lines at consecutive bars.
//!
//! Two conventions are used:
//! - strict (`*_strict`): yesterday strictly on one side, today strictly on
//!   the other. Used for current-bar signals.
//! - loose: yesterday on one side *or touching*, today strictly on the other.
//!   Used by the backtest scan, so a cross that passes through an exact tie
//!   is still counted once.
//!
//! Any NaN operand makes every test false.

/// `a` moved from strictly below `b` to strictly above it.
pub fn crossed_above_strict(prev_a: f64, prev_b: f64, cur_a: f64, cur_b: f64) -> bool {
    prev_a < prev_b && cur_a > cur_b
}

/// `a` moved from strictly above `b` to strictly below it.
pub fn crossed_below_strict(prev_a: f64, prev_b: f64, cur_a: f64, cur_b: f64) -> bool {
    prev_a > prev_b && cur_a < cur_b
}

/// `a` moved from below-or-equal `b` to strictly above it.
pub fn crossed_above(prev_a: f64, prev_b: f64, cur_a: f64, cur_b: f64) -> bool {
    prev_a <= prev_b && cur_a > cur_b
}

/// `a` moved from above-or-equal `b` to strictly below it.
pub fn crossed_below(prev_a: f64, prev_b: f64, cur_a: f64, cur_b: f64) -> bool {
    prev_a >= prev_b && cur_a < cur_b
}
