//! TOML run configuration.
//!
//! ```toml
//! [backtest]
//! start = "2015-01-01"
//! end = "2015-02-28"
//! initial_cash = 1000000.0
//! frequency = "daily"
//!
//! [data]
//! source = "csv"
//! path = "bars.csv"
//!
//! [sizing]
//! type = "full_equity"
//!
//! [[models]]
//! type = "constant"
//! tickers = ["AAPL US Equity"]
//! params = { exposure = "long", fraction_at_risk = 0.05 }
//! ```

use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use riskreplay_core::data::parse_timestamp;
use riskreplay_core::domain::{Exposure, Ticker};
use riskreplay_core::engine::EngineConfig;
use riskreplay_core::model::MovingAverageParams;
use riskreplay_core::schedule::{Frequency, MarketHours, ScheduleConfig, TradingCalendar};
use riskreplay_core::sizers::SizerConfig;
use riskreplay_core::strategy::RebalancePolicy;

/// Content hash of a configuration.
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {field} timestamp '{value}'")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("model #{index} ({kind}): {message}")]
    InvalidModel {
        index: usize,
        kind: ModelKind,
        message: String,
    },

    #[error("no [[models]] configured")]
    NoModels,

    #[error("{0}")]
    Invalid(String),

    #[error("config serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Full run configuration as read from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub market_hours: MarketHours,
    pub data: DataConfig,
    #[serde(default)]
    pub sizing: SizerConfig,
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    /// `YYYY-MM-DD` (midnight) or `YYYY-MM-DD HH:MM:SS`.
    pub start: String,
    /// `YYYY-MM-DD` (end of that day) or `YYYY-MM-DD HH:MM:SS`.
    pub end: String,
    pub initial_cash: f64,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default = "default_true")]
    pub use_stop_losses: bool,
    #[serde(default)]
    pub rebalance: RebalancePolicy,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    #[serde(default)]
    pub calendar: TradingCalendar,
}

fn default_true() -> bool {
    true
}

fn default_lookback_days() -> u32 {
    10
}

/// Where bars come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DataConfig {
    /// `timestamp,ticker,open,high,low,close,volume` file. Relative paths are
    /// resolved against the config file's directory by [`BacktestConfig::load`].
    Csv { path: PathBuf },
    /// Seeded random walk covering the run plus its warm-up window.
    Synthetic {
        #[serde(default)]
        seed: u64,
        #[serde(default = "default_initial_price")]
        initial_price: f64,
        #[serde(default = "default_volatility")]
        volatility: f64,
        #[serde(default)]
        drift: f64,
    },
}

fn default_initial_price() -> f64 {
    100.0
}

fn default_volatility() -> f64 {
    0.02
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Constant,
    MovingAverage,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Constant => write!(f, "constant"),
            ModelKind::MovingAverage => write!(f, "moving_average"),
        }
    }
}

/// One `[[models]]` entry: a model type, its parameters, and the tickers it
/// drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(rename = "type")]
    pub kind: ModelKind,
    pub tickers: Vec<Ticker>,
    #[serde(default)]
    pub params: toml::Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantParams {
    pub exposure: Exposure,
    pub fraction_at_risk: f64,
}

/// Decoded model parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelParams {
    Constant(ConstantParams),
    MovingAverage(MovingAverageParams),
}

impl ModelConfig {
    pub fn constant(exposure: Exposure, fraction_at_risk: f64, tickers: Vec<Ticker>) -> Self {
        let mut params = toml::Table::new();
        params.insert("exposure".into(), toml::Value::String(exposure_str(exposure).into()));
        params.insert("fraction_at_risk".into(), toml::Value::Float(fraction_at_risk));
        Self {
            kind: ModelKind::Constant,
            tickers,
            params,
        }
    }

    /// Decode `params` into the parameter struct for `kind`.
    pub fn decode(&self, index: usize) -> Result<ModelParams, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidModel {
            index,
            kind: self.kind,
            message,
        };
        let table = toml::Value::Table(self.params.clone());
        match self.kind {
            ModelKind::Constant => table
                .try_into::<ConstantParams>()
                .map(ModelParams::Constant)
                .map_err(|e| invalid(e.to_string())),
            ModelKind::MovingAverage => {
                let params = table
                    .try_into::<MovingAverageParams>()
                    .map_err(|e| invalid(e.to_string()))?;
                params.validate().map_err(|e| invalid(e.to_string()))?;
                Ok(ModelParams::MovingAverage(params))
            }
        }
    }
}

fn exposure_str(exposure: Exposure) -> &'static str {
    match exposure {
        Exposure::Long => "long",
        Exposure::Short => "short",
        Exposure::Out => "out",
    }
}

impl BacktestConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a config file. A relative CSV path is resolved against the file's
    /// directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        if let DataConfig::Csv { path: csv_path } = &mut config.data {
            if csv_path.is_relative() {
                if let Some(dir) = path.parent() {
                    *csv_path = dir.join(&*csv_path);
                }
            }
        }
        log::debug!("loaded config {}", path.display());
        Ok(config)
    }

    pub fn start(&self) -> Result<NaiveDateTime, ConfigError> {
        parse_bound("start", &self.backtest.start, false)
    }

    pub fn end(&self) -> Result<NaiveDateTime, ConfigError> {
        parse_bound("end", &self.backtest.end, true)
    }

    pub fn schedule(&self) -> Result<ScheduleConfig, ConfigError> {
        Ok(
            ScheduleConfig::new(self.start()?, self.end()?, self.backtest.frequency)
                .with_market_hours(self.market_hours)
                .with_calendar(self.backtest.calendar),
        )
    }

    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        Ok(EngineConfig::new(self.schedule()?, self.backtest.initial_cash)
            .with_stop_losses(self.backtest.use_stop_losses)
            .with_rebalance(self.backtest.rebalance)
            .with_lookback_days(self.backtest.lookback_days))
    }

    /// All bound tickers in configuration order.
    pub fn tickers(&self) -> Vec<Ticker> {
        self.models
            .iter()
            .flat_map(|m| m.tickers.iter().cloned())
            .collect()
    }

    /// Check everything that can be checked without touching data.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine_config()?
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.sizing
            .build()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.models.is_empty() {
            return Err(ConfigError::NoModels);
        }
        for (index, model) in self.models.iter().enumerate() {
            if model.tickers.is_empty() {
                return Err(ConfigError::InvalidModel {
                    index,
                    kind: model.kind,
                    message: "no tickers".into(),
                });
            }
            model.decode(index)?;
        }
        let mut seen = std::collections::BTreeSet::new();
        for ticker in self.tickers() {
            if !seen.insert(ticker.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "ticker {ticker} is bound to more than one model"
                )));
            }
        }
        Ok(())
    }

    /// Copy with every model's fraction at risk replaced: constant models take
    /// it directly, moving-average models as their fallback fraction.
    pub fn with_fraction_at_risk(&self, fraction: f64) -> Self {
        let mut config = self.clone();
        for model in &mut config.models {
            let key = match model.kind {
                ModelKind::Constant => "fraction_at_risk",
                ModelKind::MovingAverage => "fallback_fraction",
            };
            model.params.insert(key.into(), toml::Value::Float(fraction));
        }
        config
    }

    /// BLAKE3 over the canonical JSON of the configuration.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

fn parse_bound(field: &'static str, raw: &str, end_of_day: bool) -> Result<NaiveDateTime, ConfigError> {
    let invalid = || ConfigError::InvalidTimestamp {
        field,
        value: raw.to_string(),
    };
    let parsed = parse_timestamp(raw).ok_or_else(invalid)?;
    let date_only = !raw.trim().contains([' ', 'T']);
    if end_of_day && date_only {
        let last = NaiveTime::from_hms_opt(23, 59, 59).ok_or_else(invalid)?;
        Ok(parsed.date().and_time(last))
    } else {
        Ok(parsed)
    }
}
