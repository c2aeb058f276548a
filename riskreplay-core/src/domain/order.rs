//! Orders: market orders from the orchestrator and standing stop orders
//! owned by the risk manager.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Exposure, Ticker};

/// How an order is priced when it is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderKind {
    /// Fills at the bar's trade price supplied by the caller.
    Market,
    /// Fills at `stop_price`, or at the open when the bar gapped through it.
    Stop { stop_price: f64 },
}

/// A request to change a position by a signed quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub ticker: Ticker,
    /// Positive buys, negative sells.
    pub quantity: f64,
    pub kind: OrderKind,
}

impl Order {
    pub fn market(ticker: impl Into<Ticker>, quantity: f64) -> Self {
        Self {
            ticker: ticker.into(),
            quantity,
            kind: OrderKind::Market,
        }
    }

    pub fn stop(ticker: impl Into<Ticker>, quantity: f64, stop_price: f64) -> Self {
        Self {
            ticker: ticker.into(),
            quantity,
            kind: OrderKind::Stop { stop_price },
        }
    }

    /// Zero-quantity orders mean target == current and resolve to nothing.
    pub fn is_noop(&self) -> bool {
        self.quantity == 0.0
    }
}

/// Standing protective exit level for one open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopOrder {
    pub ticker: Ticker,
    /// Direction of the position being protected (`Long` or `Short`).
    pub direction: Exposure,
    pub stop_price: f64,
    /// Reference price the stop was anchored to at decision time.
    pub entry_price: f64,
    pub fraction_at_risk: f64,
    pub created_at: NaiveDateTime,
}

impl StopOrder {
    /// Anchor a stop `fraction_at_risk` away from `entry_price`, below it for
    /// longs and above it for shorts. Returns `None` for `Exposure::Out`.
    pub fn anchored(
        ticker: impl Into<Ticker>,
        direction: Exposure,
        entry_price: f64,
        fraction_at_risk: f64,
        created_at: NaiveDateTime,
    ) -> Option<Self> {
        let stop_price = match direction {
            Exposure::Long => entry_price * (1.0 - fraction_at_risk),
            Exposure::Short => entry_price * (1.0 + fraction_at_risk),
            Exposure::Out => return None,
        };
        Some(Self {
            ticker: ticker.into(),
            direction,
            stop_price,
            entry_price,
            fraction_at_risk,
            created_at,
        })
    }
}
