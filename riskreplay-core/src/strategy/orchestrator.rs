//! Strategy orchestrator.
//!
//! Per decision tick (session open), for each bound ticker in configuration
//! order:
//!
//! 1. ask the model for the desired exposure and fraction at risk
//! 2. size the target quantity from the equity snapshot and reference price
//! 3. emit a market order for `target - current`, filled at the session open
//! 4. register (or clear) the ticker's protective stop
//!
//! The orchestrator never touches the ledger: it returns transactions for the
//! engine to apply.
//!
//! Stops fire only when a bar completes, and the session open completes no
//! bar, so a ticker stopped out is never re-decided on the same tick.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::data::MarketDataWindow;
use crate::domain::{Exposure, Order, Portfolio, StopOrder, Ticker, Transaction};
use crate::engine::EngineError;
use crate::execution::TransactionBuilder;
use crate::model::ModelBindings;
use crate::risk::StopLossManager;
use crate::sizers::PositionSizer;

/// When a decision tick recomputes a ticker's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalancePolicy {
    /// Recompute the target from scratch every decision tick.
    #[default]
    EveryTick,
    /// Only act when the desired exposure differs from the current one.
    OnExposureChange,
}

/// Read-only inputs for one decision tick.
pub struct DecisionContext<'a> {
    pub timestamp: NaiveDateTime,
    /// Stamp of the bar whose open prices market orders fill at.
    pub open_bar: NaiveDateTime,
    /// Equity snapshot taken before any decision of this tick.
    pub equity: f64,
    pub ledger: &'a Portfolio,
    pub window: &'a MarketDataWindow,
}

pub struct StrategyOrchestrator {
    bindings: ModelBindings,
    sizer: Box<dyn PositionSizer>,
    builder: TransactionBuilder,
    policy: RebalancePolicy,
    use_stop_losses: bool,
    exposures: BTreeMap<Ticker, Exposure>,
}

impl StrategyOrchestrator {
    pub fn new(
        bindings: ModelBindings,
        sizer: Box<dyn PositionSizer>,
        policy: RebalancePolicy,
        use_stop_losses: bool,
    ) -> Self {
        let exposures = bindings
            .tickers()
            .into_iter()
            .map(|t| (t, Exposure::Out))
            .collect();
        Self {
            bindings,
            sizer,
            builder: TransactionBuilder::new(),
            policy,
            use_stop_losses,
            exposures,
        }
    }

    pub fn exposure(&self, ticker: &str) -> Exposure {
        self.exposures.get(ticker).copied().unwrap_or_default()
    }

    pub fn exposures(&self) -> &BTreeMap<Ticker, Exposure> {
        &self.exposures
    }

    /// A stop closed the ticker's position.
    pub fn mark_stopped(&mut self, ticker: &str) {
        self.exposures.insert(ticker.to_string(), Exposure::Out);
    }

    /// Run every bound model once and return the resulting transactions.
    pub fn on_decision(
        &mut self,
        ctx: &DecisionContext<'_>,
        stops: &mut StopLossManager,
    ) -> Result<Vec<Transaction>, EngineError> {
        let mut transactions = Vec::new();

        for binding in self.bindings.iter_mut() {
            for ticker in &binding.tickers {
                let current = self.exposures.get(ticker).copied().unwrap_or_default();
                let desired = binding.model.desired_exposure(ticker, current)?;
                let fraction = binding.model.fraction_at_risk(ticker)?;
                if !(fraction.is_finite() && fraction > 0.0 && fraction <= 1.0) {
                    return Err(EngineError::InvalidFractionAtRisk {
                        ticker: ticker.clone(),
                        value: fraction,
                    });
                }

                if self.policy == RebalancePolicy::OnExposureChange && desired == current {
                    continue;
                }

                let held = ctx.ledger.quantity(ticker);
                let (target, reference) = if desired.is_flat() {
                    (0.0, None)
                } else {
                    let reference = ctx.window.mark(ticker).ok_or_else(|| {
                        EngineError::DataUnavailable {
                            ticker: ticker.clone(),
                            timestamp: ctx.timestamp,
                        }
                    })?;
                    let target = self
                        .sizer
                        .target_quantity(ctx.equity, desired, fraction, reference)
                        .map_err(|source| EngineError::Sizing {
                            ticker: ticker.clone(),
                            source,
                        })?;
                    (target, Some(reference))
                };

                let order = Order::market(ticker.clone(), target - held);
                if !order.is_noop() {
                    let open = ctx
                        .window
                        .bar(ticker, ctx.open_bar)
                        .map(|bar| bar.open)
                        .ok_or_else(|| EngineError::DataUnavailable {
                            ticker: ticker.clone(),
                            timestamp: ctx.open_bar,
                        })?;
                    if let Some(tx) = self.builder.resolve(&order, open, ctx.timestamp) {
                        transactions.push(tx);
                    }
                }

                let resulting = held + order.quantity;
                let anchored = reference
                    .filter(|_| self.use_stop_losses && resulting != 0.0)
                    .and_then(|r| StopOrder::anchored(ticker.clone(), desired, r, fraction, ctx.timestamp));
                match anchored {
                    Some(stop) => stops.register(stop),
                    None => {
                        stops.clear(ticker);
                    }
                }

                let exposure = if resulting == 0.0 { Exposure::Out } else { desired };
                log::trace!(
                    "{} {}: {:?} -> {:?}, target {} (held {})",
                    ctx.timestamp,
                    ticker,
                    current,
                    exposure,
                    target,
                    held
                );
                self.exposures.insert(ticker.clone(), exposure);
            }
        }

        Ok(transactions)
    }
}
