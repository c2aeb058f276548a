//! Data provider trait, the price array it returns, and structured errors.
//!
//! The `DataProvider` trait abstracts over data sources (in-memory preset, CSV
//! import, synthetic generator) so the engine and models can be handed any of
//! them behind an `Arc<dyn DataProvider>`.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::domain::{BarError, PriceBar, PriceField, Ticker};
use crate::schedule::Frequency;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("unknown ticker: {ticker}")]
    UnknownTicker { ticker: Ticker },

    #[error("provider serves {available} bars, {requested} requested")]
    FrequencyMismatch {
        requested: Frequency,
        available: Frequency,
    },

    #[error("invalid range: {start} > {end}")]
    InvalidRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("duplicate bar for {ticker} at {timestamp}")]
    DuplicateBar {
        ticker: Ticker,
        timestamp: NaiveDateTime,
    },

    #[error("invalid bar: {0}")]
    InvalidBar(#[from] BarError),

    #[error("parse error at record {record}: {message}")]
    Parse { record: usize, message: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Price values indexed by (timestamp, ticker, field).
///
/// Only the fields requested from the provider are stored, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceArray {
    fields: Vec<PriceField>,
    values: BTreeMap<NaiveDateTime, BTreeMap<Ticker, Vec<f64>>>,
}

impl PriceArray {
    pub fn new(fields: &[PriceField]) -> Self {
        Self {
            fields: fields.to_vec(),
            values: BTreeMap::new(),
        }
    }

    /// Store the requested fields of `bar`.
    pub fn insert_bar(&mut self, bar: &PriceBar) {
        let row = self.fields.iter().map(|f| bar.field(*f)).collect();
        self.values
            .entry(bar.timestamp)
            .or_default()
            .insert(bar.ticker.clone(), row);
    }

    pub fn fields(&self) -> &[PriceField] {
        &self.fields
    }

    pub fn get(&self, timestamp: NaiveDateTime, ticker: &str, field: PriceField) -> Option<f64> {
        let idx = self.fields.iter().position(|f| *f == field)?;
        self.values.get(&timestamp)?.get(ticker)?.get(idx).copied()
    }

    /// Reassemble a full bar; `None` unless all five OHLCV fields were requested.
    pub fn bar(&self, timestamp: NaiveDateTime, ticker: &str) -> Option<PriceBar> {
        Some(PriceBar::new(
            ticker,
            timestamp,
            self.get(timestamp, ticker, PriceField::Open)?,
            self.get(timestamp, ticker, PriceField::High)?,
            self.get(timestamp, ticker, PriceField::Low)?,
            self.get(timestamp, ticker, PriceField::Close)?,
            self.get(timestamp, ticker, PriceField::Volume)?,
        ))
    }

    /// All bars of one ticker in timestamp order.
    pub fn bars(&self, ticker: &str) -> Vec<PriceBar> {
        self.values
            .keys()
            .filter_map(|ts| self.bar(*ts, ticker))
            .collect()
    }

    /// One field of one ticker as a time series.
    pub fn series(&self, ticker: &str, field: PriceField) -> Vec<(NaiveDateTime, f64)> {
        self.values
            .keys()
            .filter_map(|ts| self.get(*ts, ticker, field).map(|v| (*ts, v)))
            .collect()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = &NaiveDateTime> {
        self.values.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of distinct timestamps.
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Source of historical bars.
///
/// `get_price` returns every stored value with `start <= timestamp <= end`
/// for the requested tickers and fields. Tickers with no bars in the range are
/// simply absent; an unknown ticker is an error.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Frequency of the stored bars.
    fn frequency(&self) -> Frequency;

    fn tickers(&self) -> Vec<Ticker>;

    fn get_price(
        &self,
        tickers: &[Ticker],
        fields: &[PriceField],
        start: NaiveDateTime,
        end: NaiveDateTime,
        frequency: Frequency,
    ) -> Result<PriceArray, DataError>;
}
