//! Full-equity sizer
//!
//! Commits `weight × equity` of notional at the reference price.

use super::{truncated_target, PositionSizer, SizingError};
use crate::domain::Exposure;

/// ```text
/// quantity = trunc(sign × weight × equity / reference_price)
/// ```
#[derive(Debug, Clone)]
pub struct FullEquitySizer {
    weight: f64,
}

impl FullEquitySizer {
    pub fn new(weight: f64) -> Result<Self, SizingError> {
        if !(weight.is_finite() && weight > 0.0) {
            return Err(SizingError::InvalidParameter(format!(
                "weight must be positive, got {weight}"
            )));
        }
        Ok(Self { weight })
    }
}

impl Default for FullEquitySizer {
    fn default() -> Self {
        Self { weight: 1.0 }
    }
}

impl PositionSizer for FullEquitySizer {
    fn target_quantity(
        &self,
        equity: f64,
        exposure: Exposure,
        _fraction_at_risk: f64,
        reference_price: f64,
    ) -> Result<f64, SizingError> {
        truncated_target(equity, exposure, self.weight, reference_price)
    }

    fn name(&self) -> &str {
        "full_equity"
    }
}
