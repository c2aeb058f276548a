//! Stop-loss risk manager.
//!
//! Owns the stop table: at most one live stop per ticker. Each completed bar is
//! checked against the ticker's stop; a breach produces exactly one closing
//! transaction for the full position and removes the stop, so later breaching
//! bars find nothing to trigger.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::domain::{Exposure, Order, PriceBar, StopOrder, Ticker, Transaction};
use crate::engine::EngineError;
use crate::execution::{GapHandler, TransactionBuilder};

#[derive(Debug, Clone, Default)]
pub struct StopLossManager {
    stops: BTreeMap<Ticker, StopOrder>,
    gaps: GapHandler,
    builder: TransactionBuilder,
}

impl StopLossManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `stop`, replacing any live stop for the same ticker.
    pub fn register(&mut self, stop: StopOrder) {
        log::debug!(
            "stop {} {:?} @ {:.4} (ref {:.4}, f={})",
            stop.ticker,
            stop.direction,
            stop.stop_price,
            stop.entry_price,
            stop.fraction_at_risk
        );
        self.stops.insert(stop.ticker.clone(), stop);
    }

    pub fn clear(&mut self, ticker: &str) -> Option<StopOrder> {
        self.stops.remove(ticker)
    }

    pub fn stop(&self, ticker: &str) -> Option<&StopOrder> {
        self.stops.get(ticker)
    }

    /// Live stops in ticker order.
    pub fn stops(&self) -> impl Iterator<Item = &StopOrder> {
        self.stops.values()
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Check one completed bar against the ticker's stop.
    ///
    /// `position` is the ledger's current signed quantity. Returns the closing
    /// transaction, stamped at `timestamp`, when the stop is breached.
    pub fn check_bar(
        &mut self,
        bar: &PriceBar,
        position: f64,
        timestamp: NaiveDateTime,
    ) -> Result<Option<Transaction>, EngineError> {
        let Some(stop) = self.stops.get(&bar.ticker) else {
            return Ok(None);
        };

        if Exposure::from_quantity(position) != stop.direction {
            return Err(EngineError::StopDesync {
                ticker: bar.ticker.clone(),
                direction: stop.direction,
                position,
            });
        }

        if !self.gaps.is_triggered(stop.direction, stop.stop_price, bar) {
            return Ok(None);
        }

        let order = Order::stop(bar.ticker.clone(), -position, stop.stop_price);
        let transaction = self.builder.resolve(&order, bar.open, timestamp);
        if let Some(tx) = &transaction {
            log::debug!(
                "stop hit {} at {}: bar low {:.4} high {:.4}, stop {:.4}, fill {:.4}",
                bar.ticker,
                timestamp,
                bar.low,
                bar.high,
                stop.stop_price,
                tx.price
            );
        }
        self.stops.remove(&bar.ticker);
        Ok(transaction)
    }
}
