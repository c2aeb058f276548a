//! RiskReplay Core: clock, data window, signal models, orchestration, stop-loss
//! risk management, execution and the portfolio ledger.
//!
//! This crate contains the heart of the backtesting engine:
//! - Domain types (bars, exposures, orders, stops, transactions, positions, ledger)
//! - Deterministic scheduler producing open / intrabar / close ticks
//! - Data providers (in-memory, CSV, synthetic) behind one trait
//! - Two-operation signal model trait with concrete models
//! - Strategy orchestrator and pluggable position sizers
//! - Stop-loss manager with gap-aware fills
//! - Tick-by-tick event loop with a fingerprinted run result

pub mod data;
pub mod domain;
pub mod engine;
pub mod execution;
pub mod fingerprint;
pub mod model;
pub mod risk;
pub mod schedule;
pub mod sizers;
pub mod strategy;

pub use engine::{Backtest, EngineConfig, EngineError, RunResult};
