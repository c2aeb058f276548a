//! Position sizers: turn an exposure and an equity snapshot into a target quantity.
//!
//! Sizers are portfolio-aware (they use equity) but signal-agnostic: the
//! exposure and fraction at risk come from the model, the reference price from
//! the market data window.

pub mod full_equity;
pub mod initial_risk;

pub use full_equity::FullEquitySizer;
pub use initial_risk::InitialRiskSizer;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Exposure;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizingError {
    #[error("reference price must be positive and finite, got {0}")]
    InvalidReferencePrice(f64),

    #[error("target quantity is not finite (equity={equity}, reference={reference})")]
    NonFiniteTarget { equity: f64, reference: f64 },

    #[error("equity must be positive to size a {exposure:?} position, got {equity}")]
    NonPositiveEquity { equity: f64, exposure: Exposure },

    #[error("invalid sizer parameter: {0}")]
    InvalidParameter(String),
}

/// Sizing policy.
///
/// # Responsibilities
/// - Convert equity + exposure + fraction at risk + reference price → signed target quantity
/// - Return whole units (truncated toward zero)
///
/// # Non-Responsibilities
/// - Sizers do NOT decide direction (that's the model's job)
/// - Sizers do NOT place stops (that's the orchestrator's job)
pub trait PositionSizer: Send + Sync {
    /// Signed target quantity. `Exposure::Out` always sizes to zero.
    fn target_quantity(
        &self,
        equity: f64,
        exposure: Exposure,
        fraction_at_risk: f64,
        reference_price: f64,
    ) -> Result<f64, SizingError>;

    /// Sizer name for manifest/logging
    fn name(&self) -> &str;
}

/// Shared tail of every sizer: validate inputs, scale, truncate.
pub(crate) fn truncated_target(
    equity: f64,
    exposure: Exposure,
    leverage: f64,
    reference_price: f64,
) -> Result<f64, SizingError> {
    if exposure.is_flat() {
        return Ok(0.0);
    }
    if !(reference_price.is_finite() && reference_price > 0.0) {
        return Err(SizingError::InvalidReferencePrice(reference_price));
    }
    // a non-positive base would flip the target against the exposure
    if equity <= 0.0 {
        return Err(SizingError::NonPositiveEquity { equity, exposure });
    }
    let target = (exposure.sign() * leverage * equity / reference_price).trunc();
    if !target.is_finite() {
        return Err(SizingError::NonFiniteTarget {
            equity,
            reference: reference_price,
        });
    }
    Ok(target)
}

/// Serializable sizer selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SizerConfig {
    FullEquity {
        #[serde(default = "default_weight")]
        weight: f64,
    },
    InitialRisk {
        initial_risk: f64,
        #[serde(default = "default_max_leverage")]
        max_leverage: f64,
    },
}

fn default_weight() -> f64 {
    1.0
}

fn default_max_leverage() -> f64 {
    1.0
}

impl Default for SizerConfig {
    fn default() -> Self {
        SizerConfig::FullEquity {
            weight: default_weight(),
        }
    }
}

impl SizerConfig {
    pub fn build(&self) -> Result<Box<dyn PositionSizer>, SizingError> {
        match *self {
            SizerConfig::FullEquity { weight } => Ok(Box::new(FullEquitySizer::new(weight)?)),
            SizerConfig::InitialRisk {
                initial_risk,
                max_leverage,
            } => Ok(Box::new(InitialRiskSizer::new(initial_risk, max_leverage)?)),
        }
    }
}
