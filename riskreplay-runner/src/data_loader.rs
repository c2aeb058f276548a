//! Data provider construction for the runner.
//!
//! Resolves a [`DataConfig`] into a shared `Arc<dyn DataProvider>`:
//! - `csv`: bars read once from a file
//! - `synthetic`: seeded random walk spanning the warm-up window and the run
//!
//! Every loaded dataset is fingerprinted (BLAKE3 over its bars) so results
//! can name exactly what they ran on.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use riskreplay_core::data::{
    random_walk, CsvDataProvider, DataError, DataProvider, SyntheticConfig,
};
use riskreplay_core::domain::{PriceField, Ticker};

use crate::config::{BacktestConfig, ConfigError, DataConfig};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load {path}: {source}")]
    Csv { path: PathBuf, source: DataError },

    #[error("synthetic data generation failed: {0}")]
    Synthetic(DataError),

    #[error("ticker {ticker} not present in {provider} data")]
    MissingTicker { ticker: Ticker, provider: String },

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("dataset hashing failed: {0}")]
    Hash(#[from] serde_json::Error),
}

/// Where a dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Csv,
    Synthetic,
}

/// A provider ready to hand to the engine, with provenance.
#[derive(Clone)]
pub struct LoadedData {
    pub provider: Arc<dyn DataProvider>,
    pub source: DataSource,
    /// BLAKE3 over the bars of every configured ticker in the run window.
    pub dataset_hash: String,
    pub bar_count: usize,
}

impl std::fmt::Debug for LoadedData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedData")
            .field("provider", &self.provider.name())
            .field("source", &self.source)
            .field("dataset_hash", &self.dataset_hash)
            .field("bar_count", &self.bar_count)
            .finish()
    }
}

/// Build the provider described by `config.data` and check it covers every
/// configured ticker.
pub fn load_data(config: &BacktestConfig) -> Result<LoadedData, LoadError> {
    let frequency = config.backtest.frequency;
    let (provider, source): (Arc<dyn DataProvider>, DataSource) = match &config.data {
        DataConfig::Csv { path } => {
            let provider = CsvDataProvider::from_path(path, frequency).map_err(|source| {
                LoadError::Csv {
                    path: path.clone(),
                    source,
                }
            })?;
            (Arc::new(provider), DataSource::Csv)
        }
        DataConfig::Synthetic {
            seed,
            initial_price,
            volatility,
            drift,
        } => {
            let start = config.start()?.date()
                - Duration::days(i64::from(config.backtest.lookback_days));
            let synthetic = SyntheticConfig {
                tickers: config.tickers(),
                start,
                end: config.end()?.date(),
                frequency,
                market_hours: config.market_hours,
                calendar: config.backtest.calendar,
                initial_price: *initial_price,
                volatility: *volatility,
                drift: *drift,
                seed: *seed,
            };
            let provider = random_walk(&synthetic).map_err(LoadError::Synthetic)?;
            (Arc::new(provider), DataSource::Synthetic)
        }
    };

    let available = provider.tickers();
    for ticker in config.tickers() {
        if !available.contains(&ticker) {
            return Err(LoadError::MissingTicker {
                ticker,
                provider: provider.name().to_string(),
            });
        }
    }

    let (dataset_hash, bar_count) = dataset_hash(provider.as_ref(), config)?;
    log::info!(
        "data: {} ({} bars, hash {})",
        provider.name(),
        bar_count,
        &dataset_hash[..12]
    );
    Ok(LoadedData {
        provider,
        source,
        dataset_hash,
        bar_count,
    })
}

/// Hash the bars a run can see: warm-up window through the end of the run.
fn dataset_hash(
    provider: &dyn DataProvider,
    config: &BacktestConfig,
) -> Result<(String, usize), LoadError> {
    let tickers = config.tickers();
    let start = config.start()?.date().and_hms_opt(0, 0, 0).unwrap_or_default()
        - Duration::days(i64::from(config.backtest.lookback_days));
    let end = config.end()?;
    let array = provider.get_price(
        &tickers,
        &PriceField::ohlcv(),
        start,
        end,
        config.backtest.frequency,
    )?;

    let mut hasher = blake3::Hasher::new();
    let mut count = 0;
    for ticker in &tickers {
        let bars = array.bars(ticker);
        count += bars.len();
        hasher.update(ticker.as_bytes());
        hasher.update(&serde_json::to_vec(&bars)?);
    }
    Ok((hasher.finalize().to_hex().to_string(), count))
}
