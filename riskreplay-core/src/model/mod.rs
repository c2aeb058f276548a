//! Signal models: the pluggable decision capability.
//!
//! A model answers two questions per ticker: which exposure it wants now, and
//! what fraction of the reference price it is prepared to risk. Everything
//! else (sizing, orders, stops) belongs to the orchestrator.

pub mod bindings;
pub mod constant;
pub mod indicators;
pub mod moving_average;

pub use bindings::{BindingError, ModelBinding, ModelBindings};
pub use constant::ConstantExposureModel;
pub use moving_average::{MovingAverageCrossModel, MovingAverageParams};

use thiserror::Error;

use crate::data::DataError;
use crate::domain::{Exposure, Ticker};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model has no simulated clock set")]
    NoClock,

    #[error("model is not bound to ticker {ticker}")]
    UnknownTicker { ticker: Ticker },

    #[error("invalid model parameter: {0}")]
    InvalidParameter(String),

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Decision logic for a set of tickers.
///
/// `fraction_at_risk` must return a value in `(0, 1]`; the orchestrator treats
/// anything else as fatal.
pub trait SignalModel: Send {
    fn desired_exposure(&mut self, ticker: &str, current: Exposure) -> Result<Exposure, ModelError>;

    fn fraction_at_risk(&self, ticker: &str) -> Result<f64, ModelError>;

    /// Model name for logs and manifests.
    fn name(&self) -> &str {
        "model"
    }
}
