//! TOML run configuration.
//!
//! ```toml
//! [data]
//! symbol = "AAPL"
//! interval = "5m"
//! csv = "data/AAPL_5m.csv"      # or: synthetic = true
//! start_date = "2024-01-02"     # optional for csv, required for synthetic
//! end_date = "2024-01-31"
//!
//! [signals]                     # any omitted key keeps its default
//! breakout_lookback = 20
//!
//! [output]
//! dir = "results"
//! tail_rows = 10
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use confluence_core::{Interval, SignalParams};

/// Errors from reading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid [signals] section: {0}")]
    Signals(#[from] confluence_core::ConfigError),

    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("end_date {end} is before start_date {start}")]
    DateRange { start: NaiveDate, end: NaiveDate },

    #[error("[data] needs a bar source: set `csv = \"path\"` or `synthetic = true`")]
    NoSource,

    #[error("[data] sets both `csv` and `synthetic = true`; pick one")]
    ConflictingSources,

    #[error("synthetic data needs both start_date and end_date")]
    SyntheticNeedsDates,
}

/// Where bars come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarSource {
    Csv(PathBuf),
    Synthetic,
}

/// `[data]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    pub symbol: String,
    #[serde(default = "default_interval")]
    pub interval: Interval,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv: Option<PathBuf>,
    #[serde(default)]
    pub synthetic: bool,
    /// Inclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Inclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

fn default_interval() -> Interval {
    Interval::OneDay
}

impl DataConfig {
    pub fn source(&self) -> Result<BarSource, ConfigError> {
        match (&self.csv, self.synthetic) {
            (Some(_), true) => Err(ConfigError::ConflictingSources),
            (Some(path), false) => Ok(BarSource::Csv(path.clone())),
            (None, true) => Ok(BarSource::Synthetic),
            (None, false) => Err(ConfigError::NoSource),
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Artifacts go to `{dir}/{symbol}_{interval}_{hash}/`.
    pub dir: PathBuf,
    /// Rows shown in the text summary.
    pub tail_rows: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("results"),
            tail_rows: 10,
        }
    }
}

/// A complete run: which bars, which parameters, where the output goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub signals: SignalParams,
    #[serde(default)]
    pub output: OutputConfig,
}

impl RunConfig {
    /// Load from a TOML file. A relative `csv` path is resolved against the
    /// file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let (Some(csv), Some(base)) = (config.data.csv.as_mut(), path.parent()) {
            if csv.is_relative() {
                *csv = base.join(&*csv);
            }
        }
        Ok(config)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// A synthetic run over `[start, end]` with default parameters.
    pub fn synthetic(
        symbol: impl Into<String>,
        interval: Interval,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            data: DataConfig {
                symbol: symbol.into(),
                interval,
                csv: None,
                synthetic: true,
                start_date: Some(start),
                end_date: Some(end),
            },
            signals: SignalParams::default(),
            output: OutputConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if let (Some(start), Some(end)) = (self.data.start_date, self.data.end_date) {
            if end < start {
                return Err(ConfigError::DateRange { start, end });
            }
        }
        if self.data.source()? == BarSource::Synthetic
            && (self.data.start_date.is_none() || self.data.end_date.is_none())
        {
            return Err(ConfigError::SyntheticNeedsDates);
        }
        self.signals.validate()?;
        Ok(())
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
