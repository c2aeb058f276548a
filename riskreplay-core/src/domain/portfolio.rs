//! Portfolio ledger: cash, positions, transaction log, equity series.
//!
//! Append-only: transactions are applied once and never rewritten. The
//! accounting identity `equity == cash + sum(quantity * mark)` holds for every
//! recorded equity point.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::position::Position;
use super::transaction::Transaction;
use super::Ticker;

/// Last known price per ticker.
pub type Marks = BTreeMap<Ticker, f64>;

/// One end-of-tick equity sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("zero-quantity transaction for {ticker}")]
    ZeroQuantity { ticker: Ticker },

    #[error("non-finite transaction for {ticker}: quantity={quantity}, price={price}")]
    NonFinite {
        ticker: Ticker,
        quantity: f64,
        price: f64,
    },

    #[error("transaction for {ticker} at {timestamp} precedes last entry at {last}")]
    OutOfOrder {
        ticker: Ticker,
        timestamp: NaiveDateTime,
        last: NaiveDateTime,
    },

    #[error("no mark price for open position in {ticker}")]
    MissingMark { ticker: Ticker },
}

/// Aggregate portfolio state for one run.
#[derive(Debug, Clone)]
pub struct Portfolio {
    initial_cash: f64,
    cash: f64,
    positions: BTreeMap<Ticker, Position>,
    transactions: Vec<Transaction>,
    equity_series: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            positions: BTreeMap::new(),
            transactions: Vec::new(),
            equity_series: Vec::new(),
        }
    }

    /// Apply a transaction: `cash -= q * p`, `position += q`, append to the log.
    pub fn apply(&mut self, transaction: Transaction) -> Result<(), LedgerError> {
        if transaction.quantity == 0.0 {
            return Err(LedgerError::ZeroQuantity {
                ticker: transaction.ticker,
            });
        }
        if !transaction.quantity.is_finite() || !transaction.price.is_finite() {
            return Err(LedgerError::NonFinite {
                ticker: transaction.ticker,
                quantity: transaction.quantity,
                price: transaction.price,
            });
        }
        if let Some(last) = self.transactions.last() {
            if transaction.timestamp < last.timestamp {
                return Err(LedgerError::OutOfOrder {
                    ticker: transaction.ticker,
                    timestamp: transaction.timestamp,
                    last: last.timestamp,
                });
            }
        }

        self.cash += transaction.cash_flow();
        self.positions
            .entry(transaction.ticker.clone())
            .or_insert_with(|| Position::flat(transaction.ticker.clone()))
            .apply_fill(transaction.quantity, transaction.price);

        log::debug!(
            "ledger: {} {:+} @ {} ({:?}) cash={:.4}",
            transaction.ticker,
            transaction.quantity,
            transaction.price,
            transaction.origin,
            self.cash
        );
        self.transactions.push(transaction);
        Ok(())
    }

    /// Total equity = cash + sum of marked position values.
    pub fn equity(&self, marks: &Marks) -> Result<f64, LedgerError> {
        let mut position_value = 0.0;
        for (ticker, pos) in self.positions.iter().filter(|(_, p)| !p.is_flat()) {
            let price = marks
                .get(ticker)
                .copied()
                .ok_or_else(|| LedgerError::MissingMark {
                    ticker: ticker.clone(),
                })?;
            position_value += pos.market_value(price);
        }
        Ok(self.cash + position_value)
    }

    /// Compute equity at `timestamp` and append it to the equity series.
    pub fn record_equity(
        &mut self,
        timestamp: NaiveDateTime,
        marks: &Marks,
    ) -> Result<f64, LedgerError> {
        let equity = self.equity(marks)?;
        self.equity_series.push(EquityPoint { timestamp, equity });
        Ok(equity)
    }

    /// Signed quantity held in `ticker` (0 if never traded).
    pub fn quantity(&self, ticker: &str) -> f64 {
        self.positions.get(ticker).map_or(0.0, |p| p.quantity)
    }

    pub fn position(&self, ticker: &str) -> Option<&Position> {
        self.positions.get(ticker).filter(|p| !p.is_flat())
    }

    /// Open (non-flat) positions in ticker order.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values().filter(|p| !p.is_flat())
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn equity_series(&self) -> &[EquityPoint] {
        &self.equity_series
    }
}
