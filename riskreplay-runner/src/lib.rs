//! RiskReplay Runner: configuration, data loading, runs, sweeps, export.
//!
//! This crate builds on `riskreplay-core` to provide:
//! - TOML run configuration with validation and content-addressed run ids
//! - Data provider construction (CSV file or seeded synthetic walk)
//! - Single-run orchestration producing a fingerprinted `BacktestResult`
//! - Parallel fraction-at-risk sweeps over one shared dataset
//! - JSON and CSV export of results

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, ConfigError, DataConfig, ModelConfig, ModelKind, RunId};
pub use data_loader::{load_data, DataSource, LoadError, LoadedData};
pub use export::{load_artifacts, save_artifacts, save_sweep};
pub use runner::{run_backtest_from_data, run_single_backtest, BacktestResult, RunError};
pub use sweep::{parse_fractions, run_fraction_sweep, SweepEntry, SweepResults};
