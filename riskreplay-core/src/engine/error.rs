//! Fatal engine conditions. Any of these aborts the run.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::data::DataError;
use crate::domain::{Exposure, LedgerError, Ticker};
use crate::model::{BindingError, ModelError};
use crate::schedule::ScheduleError;
use crate::sizers::SizingError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no data for {ticker} at {timestamp}")]
    DataUnavailable {
        ticker: Ticker,
        timestamp: NaiveDateTime,
    },

    #[error("fraction at risk for {ticker} must be in (0, 1], got {value}")]
    InvalidFractionAtRisk { ticker: Ticker, value: f64 },

    #[error("sizing {ticker}: {source}")]
    Sizing { ticker: Ticker, source: SizingError },

    #[error("stop for {ticker} protects a {direction:?} position but the ledger holds {position}")]
    StopDesync {
        ticker: Ticker,
        direction: Exposure,
        position: f64,
    },

    #[error("ticker {ticker} is bound to more than one model")]
    TickerOverlap { ticker: Ticker },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<BindingError> for EngineError {
    fn from(err: BindingError) -> Self {
        match err {
            BindingError::TickerOverlap { ticker } => EngineError::TickerOverlap { ticker },
            other => EngineError::Config(other.to_string()),
        }
    }
}
