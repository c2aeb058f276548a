//! Gap handling: stop triggers and gap-aware fill prices.
//!
//! Gap rule: if the bar opens already past the stop (below it for a long,
//! above it for a short), the exit fills at the open, which is worse than the
//! stop. Otherwise it fills exactly at the stop.

use crate::domain::{Exposure, PriceBar};

/// Stateless helper shared by the risk manager and the transaction builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct GapHandler;

impl GapHandler {
    pub fn new() -> Self {
        Self
    }

    /// Whether the bar touched the stop protecting a `direction` position.
    pub fn is_triggered(&self, direction: Exposure, stop_price: f64, bar: &PriceBar) -> bool {
        match direction {
            Exposure::Long => bar.low <= stop_price,
            Exposure::Short => bar.high >= stop_price,
            Exposure::Out => false,
        }
    }

    /// Whether the open is already beyond the stop.
    pub fn did_gap_through(&self, direction: Exposure, stop_price: f64, open: f64) -> bool {
        match direction {
            Exposure::Long => open < stop_price,
            Exposure::Short => open > stop_price,
            Exposure::Out => false,
        }
    }

    /// Exit price for a triggered stop.
    pub fn fill_price(&self, direction: Exposure, stop_price: f64, open: f64) -> f64 {
        if self.did_gap_through(direction, stop_price, open) {
            open
        } else {
            stop_price
        }
    }
}
