//! Backtesting engine: tick-by-tick event loop and run types.
//!
//! The engine consumes ticks from the scheduler and, per tick:
//!
//! 1. Risk: stop checks on completed bars, mark updates
//! 2. Decision: model queries, sizing, market orders, stop registration
//! 3. Equity: end-of-day equity recorded on close ticks

pub mod error;
pub mod event_loop;
pub mod state;

pub use error::EngineError;
pub use event_loop::Backtest;
pub use state::{EngineConfig, RunResult};
