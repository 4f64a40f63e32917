//! `siglab.toml`: file configuration for the runner and CLI.
//!
//! Every table and field is optional; missing values take their defaults.
//!
//! ```toml
//! [analysis]
//! ma_windows = [5, 10, 20]
//!
//! [analysis.backtest]
//! lookback = 120
//! holding_days = 5
//!
//! [data]
//! dir = "data"
//! history_days = 365
//!
//! [screen]
//! symbols = ["000001", "600519"]
//!
//! [commentary]
//! model = "gpt-4o"
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use siglab_core::{AnalysisConfig, ParamError};

use crate::commentary::CommentaryConfig;

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid analysis parameters: {0}")]
    Invalid(#[from] ParamError),
}

/// Where bars come from and which dates to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory of `<symbol>.csv` files.
    pub dir: Option<PathBuf>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Calendar days loaded before `end` when `start` is not set.
    pub history_days: u32,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: None,
            start: None,
            end: None,
            history_days: 365,
        }
    }
}

impl DataConfig {
    /// Resolve the load range; `today` stands in for a missing `end`.
    pub fn range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let end = self.end.unwrap_or(today);
        let start = self
            .start
            .unwrap_or_else(|| end - chrono::Duration::days(i64::from(self.history_days)));
        (start, end)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiglabConfig {
    pub analysis: AnalysisConfig,
    pub data: DataConfig,
    pub screen: ScreenConfig,
    pub commentary: CommentaryConfig,
}

impl SiglabConfig {
    /// Read, parse and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(cfg)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigFileError> {
        let cfg: Self = toml::from_str(content)?;
        cfg.analysis.validate()?;
        Ok(cfg)
    }

    /// Pretty TOML. The API key is never written.
    pub fn to_toml(&self) -> Result<String, ConfigFileError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siglab_core::BacktestSignal;

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = SiglabConfig::from_toml("").unwrap();
        assert_eq!(cfg, SiglabConfig::default());
        assert_eq!(cfg.commentary.model, "gpt-4o");
        assert_eq!(cfg.analysis.backtest.lookback, 120);
    }

    #[test]
    fn nested_tables_override_fields() {
        let cfg = SiglabConfig::from_toml(
            r#"
            [analysis]
            ma_windows = [5, 10, 20, 60]
            rsi_window = 6

            [analysis.thresholds]
            volume_multiple = 2.0

            [analysis.backtest]
            holding_days = 10
            signal = { type = "ma_cross", fast = 5, slow = 20 }

            [screen]
            symbols = ["000001", "600519"]

            [commentary]
            max_attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.ma_windows, vec![5, 10, 20, 60]);
        assert_eq!(cfg.analysis.rsi_window, 6);
        assert_eq!(cfg.analysis.thresholds.volume_multiple, 2.0);
        assert_eq!(cfg.analysis.thresholds.rsi_oversold, 30.0);
        assert_eq!(cfg.analysis.backtest.holding_days, 10);
        assert_eq!(cfg.analysis.backtest.lookback, 120);
        assert_eq!(
            cfg.analysis.backtest.signal,
            BacktestSignal::MaCross { fast: 5, slow: 20 }
        );
        assert_eq!(cfg.screen.symbols.len(), 2);
        assert_eq!(cfg.commentary.max_attempts, 5);
        assert_eq!(cfg.commentary.retry_delay_secs, 2);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let err = SiglabConfig::from_toml("[analysis.backtest]\nholding_days = 0\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::Invalid(ParamError::ZeroWindow { .. })));
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let err = SiglabConfig::from_toml("[analysis\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::Parse(_)));
    }

    #[test]
    fn load_from_file_and_skip_api_key_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("siglab.toml");
        std::fs::write(&path, "[commentary]\napi_key = \"sk-secret\"\n").unwrap();

        let cfg = SiglabConfig::load(&path).unwrap();
        assert_eq!(cfg.commentary.api_key.as_deref(), Some("sk-secret"));
        assert!(!cfg.to_toml().unwrap().contains("sk-secret"));

        assert!(matches!(
            SiglabConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigFileError::Io { .. })
        ));
    }

    #[test]
    fn data_range_defaults_to_trailing_year() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let (start, end) = DataConfig::default().range(today);
        assert_eq!(end, today);
        assert_eq!(start, NaiveDate::from_ymd_opt(2023, 7, 1).unwrap());
    }
}
