//! Initial-risk sizer
//!
//! Sizes so that touching the stop loses `initial_risk × equity`.

use super::{truncated_target, PositionSizer, SizingError};
use crate::domain::Exposure;

/// # Formula
/// ```text
/// leverage = min(initial_risk / fraction_at_risk, max_leverage)
/// quantity = trunc(sign × leverage × equity / reference_price)
/// ```
///
/// # Example
/// - Equity: $100,000, initial risk 1%, fraction at risk 5%
/// - Leverage: 0.01 / 0.05 = 0.2 → $20,000 notional
/// - Stop 5% away loses $1,000 = 1% of equity
#[derive(Debug, Clone)]
pub struct InitialRiskSizer {
    initial_risk: f64,
    max_leverage: f64,
}

impl InitialRiskSizer {
    pub fn new(initial_risk: f64, max_leverage: f64) -> Result<Self, SizingError> {
        if !(initial_risk > 0.0 && initial_risk < 1.0) {
            return Err(SizingError::InvalidParameter(format!(
                "initial_risk must be in (0, 1), got {initial_risk}"
            )));
        }
        if !(max_leverage.is_finite() && max_leverage > 0.0) {
            return Err(SizingError::InvalidParameter(format!(
                "max_leverage must be positive, got {max_leverage}"
            )));
        }
        Ok(Self {
            initial_risk,
            max_leverage,
        })
    }
}

impl PositionSizer for InitialRiskSizer {
    fn target_quantity(
        &self,
        equity: f64,
        exposure: Exposure,
        fraction_at_risk: f64,
        reference_price: f64,
    ) -> Result<f64, SizingError> {
        if exposure.is_flat() {
            return Ok(0.0);
        }
        let leverage = (self.initial_risk / fraction_at_risk).min(self.max_leverage);
        truncated_target(equity, exposure, leverage, reference_price)
    }

    fn name(&self) -> &str {
        "initial_risk"
    }
}
