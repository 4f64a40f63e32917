//! Crossover backtest: forward returns after every historical crossover.

pub mod crossover;
pub mod summary;

pub use crossover::{run_backtest, usable_indices, BacktestReport};
pub use summary::{mean_return, summarize, win_rate, KindSummary};
