//! Analysis configuration and parameter validation.
//!
//! Everything the engine needs is passed in explicitly through
//! `AnalysisConfig`; nothing is read from globals or the environment.
//! Invalid parameters are caller errors and are rejected here, before any
//! indicator is computed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::indicators::{IndicatorParams, MacdParams};

/// Caller errors in analysis parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("{name} must be >= 1 (got 0)")]
    ZeroWindow { name: &'static str },

    #[error("holding_days ({holding_days}) must be less than lookback ({lookback})")]
    HoldingExceedsLookback { holding_days: usize, lookback: usize },

    #[error("fast window ({fast}) must be shorter than slow window ({slow}) for {name}")]
    FastNotShorter {
        name: &'static str,
        fast: usize,
        slow: usize,
    },

    #[error("MA window {window} used by {name} is not listed in ma_windows {ma_windows:?}")]
    MissingMaWindow {
        name: &'static str,
        window: usize,
        ma_windows: Vec<usize>,
    },

    #[error("threshold {name} must be a positive finite number (got {value})")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("RSI thresholds must satisfy 0 < oversold ({oversold}) < overbought ({overbought}) < 100")]
    RsiBands { oversold: f64, overbought: f64 },
}

/// Fast/slow MA pair for the MA crossover signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaCross {
    pub fast: usize,
    pub slow: usize,
}

impl Default for MaCross {
    fn default() -> Self {
        Self { fast: 5, slow: 10 }
    }
}

/// Numeric thresholds of the fixed signal set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    /// Today's volume must exceed this multiple of the prior-window mean.
    pub volume_multiple: f64,
    /// Close-to-close change today must exceed this fraction.
    pub price_change_floor: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            volume_multiple: 1.5,
            price_change_floor: 0.02,
        }
    }
}

/// Which crossover family the backtest scans for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BacktestSignal {
    /// DIF against DEA.
    MacdCross,
    /// Fast MA against slow MA.
    MaCross { fast: usize, slow: usize },
}

impl BacktestSignal {
    pub fn label(&self) -> String {
        match self {
            BacktestSignal::MacdCross => "MACD".to_string(),
            BacktestSignal::MaCross { fast, slow } => format!("MA{fast}/MA{slow}"),
        }
    }
}

/// Backtest window and holding period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestParams {
    pub signal: BacktestSignal,
    /// Trailing bars of usable history to scan.
    pub lookback: usize,
    /// Bars between entry and exit.
    pub holding_days: usize,
}

impl Default for BacktestParams {
    fn default() -> Self {
        Self {
            signal: BacktestSignal::MacdCross,
            lookback: 120,
            holding_days: 5,
        }
    }
}

impl BacktestParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.lookback == 0 {
            return Err(ParamError::ZeroWindow { name: "lookback" });
        }
        if self.holding_days == 0 {
            return Err(ParamError::ZeroWindow {
                name: "holding_days",
            });
        }
        if self.holding_days >= self.lookback {
            return Err(ParamError::HoldingExceedsLookback {
                holding_days: self.holding_days,
                lookback: self.lookback,
            });
        }
        if let BacktestSignal::MaCross { fast, slow } = self.signal {
            check_window("backtest fast MA", fast)?;
            check_window("backtest slow MA", slow)?;
            if fast >= slow {
                return Err(ParamError::FastNotShorter {
                    name: "backtest MA cross",
                    fast,
                    slow,
                });
            }
        }
        Ok(())
    }
}

/// Full parameterization of one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub ma_windows: Vec<usize>,
    pub ma_cross: MaCross,
    pub rsi_window: usize,
    pub macd: MacdParams,
    /// N for the N-day high/low signals.
    pub extrema_window: usize,
    /// Bars averaged for the volume breakout baseline.
    pub volume_window: usize,
    pub thresholds: SignalThresholds,
    pub backtest: BacktestParams,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let indicators = IndicatorParams::default();
        Self {
            ma_windows: indicators.ma_windows,
            ma_cross: MaCross::default(),
            rsi_window: indicators.rsi_window,
            macd: indicators.macd,
            extrema_window: indicators.extrema_window,
            volume_window: indicators.volume_window,
            thresholds: SignalThresholds::default(),
            backtest: BacktestParams::default(),
        }
    }
}

impl AnalysisConfig {
    /// Reject caller errors: zero windows, inverted fast/slow pairs,
    /// `holding_days >= lookback`, MA windows used but not computed, and
    /// out-of-range thresholds.
    pub fn validate(&self) -> Result<(), ParamError> {
        for &window in &self.ma_windows {
            check_window("ma_windows entry", window)?;
        }
        check_window("rsi_window", self.rsi_window)?;
        check_window("macd.fast", self.macd.fast)?;
        check_window("macd.slow", self.macd.slow)?;
        check_window("macd.signal", self.macd.signal)?;
        check_window("extrema_window", self.extrema_window)?;
        check_window("volume_window", self.volume_window)?;

        if self.macd.fast >= self.macd.slow {
            return Err(ParamError::FastNotShorter {
                name: "MACD",
                fast: self.macd.fast,
                slow: self.macd.slow,
            });
        }
        if self.ma_cross.fast >= self.ma_cross.slow {
            return Err(ParamError::FastNotShorter {
                name: "MA cross",
                fast: self.ma_cross.fast,
                slow: self.ma_cross.slow,
            });
        }
        self.require_ma_window("ma_cross", self.ma_cross.fast)?;
        self.require_ma_window("ma_cross", self.ma_cross.slow)?;

        let t = &self.thresholds;
        check_threshold("volume_multiple", t.volume_multiple)?;
        check_threshold("price_change_floor", t.price_change_floor)?;
        if !(t.rsi_oversold > 0.0 && t.rsi_oversold < t.rsi_overbought && t.rsi_overbought < 100.0)
        {
            return Err(ParamError::RsiBands {
                oversold: t.rsi_oversold,
                overbought: t.rsi_overbought,
            });
        }

        self.backtest.validate()?;
        if let BacktestSignal::MaCross { fast, slow } = self.backtest.signal {
            self.require_ma_window("backtest", fast)?;
            self.require_ma_window("backtest", slow)?;
        }
        Ok(())
    }

    /// The subset of parameters the Indicator Engine consumes.
    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            ma_windows: self.ma_windows.clone(),
            rsi_window: self.rsi_window,
            macd: self.macd,
            extrema_window: self.extrema_window,
            volume_window: self.volume_window,
        }
    }

    fn require_ma_window(&self, name: &'static str, window: usize) -> Result<(), ParamError> {
        if self.ma_windows.contains(&window) {
            Ok(())
        } else {
            Err(ParamError::MissingMaWindow {
                name,
                window,
                ma_windows: self.ma_windows.clone(),
            })
        }
    }
}

fn check_window(name: &'static str, window: usize) -> Result<(), ParamError> {
    if window == 0 {
        Err(ParamError::ZeroWindow { name })
    } else {
        Ok(())
    }
}

fn check_threshold(name: &'static str, value: f64) -> Result<(), ParamError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ParamError::InvalidThreshold { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(AnalysisConfig::default().validate(), Ok(()));
    }

    #[test]
    fn holding_days_must_be_below_lookback() {
        let mut cfg = AnalysisConfig::default();
        cfg.backtest.lookback = 10;
        cfg.backtest.holding_days = 10;
        assert_eq!(
            cfg.validate(),
            Err(ParamError::HoldingExceedsLookback {
                holding_days: 10,
                lookback: 10
            })
        );
    }

    #[test]
    fn zero_windows_rejected() {
        let mut cfg = AnalysisConfig::default();
        cfg.ma_windows = vec![5, 0, 10];
        assert!(matches!(cfg.validate(), Err(ParamError::ZeroWindow { .. })));

        let mut cfg = AnalysisConfig::default();
        cfg.rsi_window = 0;
        assert_eq!(
            cfg.validate(),
            Err(ParamError::ZeroWindow { name: "rsi_window" })
        );

        let mut cfg = AnalysisConfig::default();
        cfg.backtest.holding_days = 0;
        assert!(matches!(cfg.validate(), Err(ParamError::ZeroWindow { .. })));
    }

    #[test]
    fn ma_cross_must_use_configured_windows() {
        let mut cfg = AnalysisConfig::default();
        cfg.ma_cross = MaCross { fast: 5, slow: 30 };
        assert!(matches!(
            cfg.validate(),
            Err(ParamError::MissingMaWindow { window: 30, .. })
        ));
    }

    #[test]
    fn inverted_pairs_rejected() {
        let mut cfg = AnalysisConfig::default();
        cfg.macd = MacdParams {
            fast: 26,
            slow: 12,
            signal: 9,
        };
        assert!(matches!(
            cfg.validate(),
            Err(ParamError::FastNotShorter { name: "MACD", .. })
        ));

        let mut cfg = AnalysisConfig::default();
        cfg.backtest.signal = BacktestSignal::MaCross { fast: 10, slow: 5 };
        assert!(matches!(
            cfg.validate(),
            Err(ParamError::FastNotShorter { .. })
        ));
    }

    #[test]
    fn thresholds_checked() {
        let mut cfg = AnalysisConfig::default();
        cfg.thresholds.volume_multiple = f64::NAN;
        assert!(matches!(
            cfg.validate(),
            Err(ParamError::InvalidThreshold { .. })
        ));

        let mut cfg = AnalysisConfig::default();
        cfg.thresholds.rsi_oversold = 80.0;
        assert!(matches!(cfg.validate(), Err(ParamError::RsiBands { .. })));
    }

    #[test]
    fn backtest_signal_serde_tagging() {
        let json = serde_json::to_string(&BacktestSignal::MaCross { fast: 5, slow: 10 }).unwrap();
        assert_eq!(json, r#"{"type":"ma_cross","fast":5,"slow":10}"#);
        let back: BacktestSignal = serde_json::from_str(r#"{"type":"macd_cross"}"#).unwrap();
        assert_eq!(back, BacktestSignal::MacdCross);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: AnalysisConfig = serde_json::from_str(r#"{"rsi_window": 6}"#).unwrap();
        assert_eq!(cfg.rsi_window, 6);
        assert_eq!(cfg.ma_windows, vec![5, 10, 20]);
        assert_eq!(cfg.backtest.holding_days, 5);
    }
}
