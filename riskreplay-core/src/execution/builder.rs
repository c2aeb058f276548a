//! Transaction builder: resolves orders into immutable transactions.

use chrono::NaiveDateTime;

use super::gap_handler::GapHandler;
use crate::domain::{Exposure, Order, OrderKind, Transaction, TransactionOrigin};

/// Turns an order plus the bar price it executes against into a transaction.
///
/// No slippage and no commission: market orders fill at the supplied price,
/// stop orders at the gap-aware stop price.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionBuilder {
    gaps: GapHandler,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `order` at `timestamp`.
    ///
    /// `price` is the trade price for market orders and the bar's open for
    /// stop orders. Zero-quantity orders resolve to `None`.
    pub fn resolve(&self, order: &Order, price: f64, timestamp: NaiveDateTime) -> Option<Transaction> {
        if order.is_noop() {
            return None;
        }
        let (price, origin) = match order.kind {
            OrderKind::Market => (price, TransactionOrigin::Signal),
            OrderKind::Stop { stop_price } => {
                // a sell stop protects a long, a buy stop protects a short
                let protects = Exposure::from_quantity(-order.quantity);
                (
                    self.gaps.fill_price(protects, stop_price, price),
                    TransactionOrigin::StopLoss,
                )
            }
        };
        Some(Transaction {
            ticker: order.ticker.clone(),
            quantity: order.quantity,
            price,
            timestamp,
            origin,
        })
    }
}
