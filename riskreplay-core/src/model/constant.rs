use super::{ModelError, SignalModel};
use crate::domain::Exposure;

/// Always wants the same exposure with the same fraction at risk.
#[derive(Debug, Clone)]
pub struct ConstantExposureModel {
    exposure: Exposure,
    fraction_at_risk: f64,
}

impl ConstantExposureModel {
    pub fn new(exposure: Exposure, fraction_at_risk: f64) -> Self {
        Self {
            exposure,
            fraction_at_risk,
        }
    }

    pub fn long(fraction_at_risk: f64) -> Self {
        Self::new(Exposure::Long, fraction_at_risk)
    }

    pub fn short(fraction_at_risk: f64) -> Self {
        Self::new(Exposure::Short, fraction_at_risk)
    }
}

impl SignalModel for ConstantExposureModel {
    fn desired_exposure(&mut self, _ticker: &str, _current: Exposure) -> Result<Exposure, ModelError> {
        Ok(self.exposure)
    }

    fn fraction_at_risk(&self, _ticker: &str) -> Result<f64, ModelError> {
        Ok(self.fraction_at_risk)
    }

    fn name(&self) -> &str {
        "constant_exposure"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_current_exposure() {
        let mut model = ConstantExposureModel::long(0.05);
        for current in [Exposure::Long, Exposure::Short, Exposure::Out] {
            assert_eq!(model.desired_exposure("AAPL", current).unwrap(), Exposure::Long);
        }
        assert_eq!(model.fraction_at_risk("AAPL").unwrap(), 0.05);
    }
}
