//! Model-to-ticker bindings.

use std::collections::BTreeSet;

use thiserror::Error;

use super::SignalModel;
use crate::domain::Ticker;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("no models configured")]
    Empty,

    #[error("model binding #{index} ({model}) has no tickers")]
    NoTickers { index: usize, model: String },

    #[error("ticker {ticker} is bound to more than one model")]
    TickerOverlap { ticker: Ticker },
}

/// One model and the tickers it decides for.
pub struct ModelBinding {
    pub model: Box<dyn SignalModel>,
    pub tickers: Vec<Ticker>,
}

impl ModelBinding {
    pub fn new(model: Box<dyn SignalModel>, tickers: Vec<Ticker>) -> Self {
        Self { model, tickers }
    }
}

impl std::fmt::Debug for ModelBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBinding")
            .field("model", &self.model.name())
            .field("tickers", &self.tickers)
            .finish()
    }
}

/// Ordered bindings; each ticker belongs to exactly one model.
#[derive(Debug, Default)]
pub struct ModelBindings {
    bindings: Vec<ModelBinding>,
}

impl ModelBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, model: Box<dyn SignalModel>, tickers: Vec<Ticker>) -> Self {
        self.bindings.push(ModelBinding::new(model, tickers));
        self
    }

    pub fn push(&mut self, binding: ModelBinding) {
        self.bindings.push(binding);
    }

    pub fn validate(&self) -> Result<(), BindingError> {
        if self.bindings.is_empty() {
            return Err(BindingError::Empty);
        }
        let mut seen = BTreeSet::new();
        for (index, binding) in self.bindings.iter().enumerate() {
            if binding.tickers.is_empty() {
                return Err(BindingError::NoTickers {
                    index,
                    model: binding.model.name().to_string(),
                });
            }
            for ticker in &binding.tickers {
                if !seen.insert(ticker.as_str()) {
                    return Err(BindingError::TickerOverlap {
                        ticker: ticker.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// All bound tickers in configuration order.
    pub fn tickers(&self) -> Vec<Ticker> {
        self.bindings
            .iter()
            .flat_map(|b| b.tickers.iter().cloned())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelBinding> {
        self.bindings.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ModelBinding> {
        self.bindings.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConstantExposureModel;

    fn model() -> Box<dyn SignalModel> {
        Box::new(ConstantExposureModel::long(0.05))
    }

    #[test]
    fn disjoint_bindings_validate() {
        let bindings = ModelBindings::new()
            .bind(model(), vec!["AAPL".into(), "MSFT".into()])
            .bind(model(), vec!["SPY".into()]);
        assert!(bindings.validate().is_ok());
        assert_eq!(bindings.tickers(), vec!["AAPL", "MSFT", "SPY"]);
    }

    #[test]
    fn overlap_is_rejected() {
        let bindings = ModelBindings::new()
            .bind(model(), vec!["AAPL".into()])
            .bind(model(), vec!["SPY".into(), "AAPL".into()]);
        assert_eq!(
            bindings.validate(),
            Err(BindingError::TickerOverlap {
                ticker: "AAPL".into()
            })
        );
    }

    #[test]
    fn duplicate_within_one_binding_is_overlap() {
        let bindings = ModelBindings::new().bind(model(), vec!["AAPL".into(), "AAPL".into()]);
        assert!(matches!(
            bindings.validate(),
            Err(BindingError::TickerOverlap { .. })
        ));
    }

    #[test]
    fn empty_configurations_are_rejected() {
        assert_eq!(ModelBindings::new().validate(), Err(BindingError::Empty));
        let bindings = ModelBindings::new().bind(model(), vec![]);
        assert!(matches!(
            bindings.validate(),
            Err(BindingError::NoTickers { index: 0, .. })
        ));
    }
}
