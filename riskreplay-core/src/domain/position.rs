use serde::{Deserialize, Serialize};

use super::Ticker;

/// Current holding in one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: Ticker,
    /// Signed quantity: positive long, negative short.
    pub quantity: f64,
    /// Average cost of the open quantity; 0 when flat.
    pub avg_cost: f64,
}

impl Position {
    pub fn flat(ticker: impl Into<Ticker>) -> Self {
        Self {
            ticker: ticker.into(),
            quantity: 0.0,
            avg_cost: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0.0
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }

    pub fn is_short(&self) -> bool {
        self.quantity < 0.0
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity * (price - self.avg_cost)
    }

    /// Apply a signed fill.
    ///
    /// Adding in the same direction re-weights the average cost, reducing keeps
    /// it, flipping through zero restarts it at the fill price.
    pub fn apply_fill(&mut self, quantity: f64, price: f64) {
        let new_quantity = self.quantity + quantity;
        if new_quantity == 0.0 {
            self.avg_cost = 0.0;
        } else if self.quantity == 0.0 || self.quantity.signum() != new_quantity.signum() {
            self.avg_cost = price;
        } else if quantity.signum() == self.quantity.signum() {
            let total_cost = self.avg_cost * self.quantity + price * quantity;
            self.avg_cost = total_cost / new_quantity;
        }
        self.quantity = new_quantity;
    }
}
