use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Ticker;

/// What produced a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionOrigin {
    /// Market order from the strategy orchestrator.
    Signal,
    /// Closing fill synthesized by the stop-loss risk manager.
    StopLoss,
}

/// An executed fill. Immutable once appended to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub ticker: Ticker,
    /// Positive = buy, negative = sell.
    pub quantity: f64,
    pub price: f64,
    pub timestamp: NaiveDateTime,
    pub origin: TransactionOrigin,
}

impl Transaction {
    /// Cash impact of the fill (negative for buys).
    pub fn cash_flow(&self) -> f64 {
        -self.quantity * self.price
    }
}
