//! Backtest runner: wires configuration, data, models and the engine.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads data, then runs. Used by the CLI.
//! - `run_backtest_from_data()`: takes already-loaded data. Used by sweeps so
//!   every run in a grid shares one provider.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use riskreplay_core::engine::{Backtest, EngineError, RunResult};
use riskreplay_core::model::{
    ConstantExposureModel, ModelBindings, ModelError, MovingAverageCrossModel, SignalModel,
};
use riskreplay_core::schedule::SimTimer;

use crate::config::{BacktestConfig, ConfigError, ModelParams, RunId};
use crate::data_loader::{load_data, DataSource, LoadError, LoadedData};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("model #{index}: {source}")]
    Model { index: usize, source: ModelError },
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Content hash of the configuration.
    pub run_id: RunId,
    /// BLAKE3 over transactions and equity curve.
    pub fingerprint: String,
    pub dataset_hash: String,
    pub data_source: DataSource,
    pub config: BacktestConfig,
    pub final_equity: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub run: RunResult,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn transaction_count(&self) -> usize {
        self.run.transactions.len()
    }
}

/// Load the configured data and run once.
pub fn run_single_backtest(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let data = load_data(config)?;
    run_backtest_from_data(config, &data)
}

/// Run with pre-loaded data. No I/O.
pub fn run_backtest_from_data(
    config: &BacktestConfig,
    data: &LoadedData,
) -> Result<BacktestResult, RunError> {
    let run_id = config.run_id()?;
    let engine_config = config.engine_config()?;
    let sizer = config
        .sizing
        .build()
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;
    let timer = SimTimer::new();
    let bindings = build_bindings(config, data, &timer)?;

    log::info!("run {}: {} models, sizer {}", &run_id[..12], bindings.len(), sizer.name());
    let run = Backtest::new(engine_config, data.provider.clone(), bindings)
        .with_sizer(sizer)
        .with_timer(timer)
        .run()?;

    let fingerprint = run.fingerprint()?;
    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        fingerprint: fingerprint.to_string(),
        dataset_hash: data.dataset_hash.clone(),
        data_source: data.source,
        config: config.clone(),
        final_equity: run.final_equity(),
        total_return: run.total_return(),
        max_drawdown: run.max_drawdown(),
        run,
    })
}

/// Instantiate one model per `[[models]]` entry, all reading the same clock.
pub fn build_bindings(
    config: &BacktestConfig,
    data: &LoadedData,
    timer: &SimTimer,
) -> Result<ModelBindings, RunError> {
    let mut bindings = ModelBindings::new();
    for (index, model_config) in config.models.iter().enumerate() {
        let model: Box<dyn SignalModel> = match model_config.decode(index)? {
            ModelParams::Constant(p) => {
                Box::new(ConstantExposureModel::new(p.exposure, p.fraction_at_risk))
            }
            ModelParams::MovingAverage(p) => Box::new(
                MovingAverageCrossModel::new(
                    p,
                    data.provider.clone(),
                    timer.clone(),
                    config.backtest.frequency,
                    model_config.tickers.clone(),
                )
                .map_err(|source| RunError::Model { index, source })?,
            ),
        };
        bindings = bindings.bind(model, model_config.tickers.clone());
    }
    Ok(bindings)
}
