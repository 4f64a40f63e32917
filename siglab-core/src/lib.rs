//! SigLab Core: OHLCV series, indicator engine, signal evaluator, crossover backtest.
//!
//! This crate is pure computation over one series at a time:
//! - Domain types (bars, validated series, trade records)
//! - Indicator Frame with a fixed column schema (MA, EMA, MACD, RSI, prior extrema)
//! - Current-bar evaluation of the fixed signal set
//! - Historical crossover backtest with per-direction win rates
//! - CSV and synthetic data providers

pub mod backtest;
pub mod config;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod signals;

pub use backtest::{run_backtest, BacktestReport, KindSummary};
pub use config::{AnalysisConfig, BacktestParams, BacktestSignal, MaCross, ParamError, SignalThresholds};
pub use domain::{Bar, CrossDirection, Series, SeriesError, TradeRecord};
pub use indicators::{IndicatorFrame, IndicatorParams, IndicatorSnapshot};
pub use signals::{evaluate_signals, evaluate_signals_at, SignalKind, SignalReport, SignalStatus};
