//! In-memory provider over a fixed set of bars.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use super::provider::{DataError, DataProvider, PriceArray};
use crate::domain::{PriceBar, PriceField, Ticker};
use crate::schedule::Frequency;

/// Serves bars held in memory. Bars are validated on construction.
#[derive(Debug, Clone)]
pub struct PresetDataProvider {
    name: String,
    frequency: Frequency,
    bars: BTreeMap<Ticker, BTreeMap<NaiveDateTime, PriceBar>>,
}

impl PresetDataProvider {
    pub fn new(frequency: Frequency, bars: Vec<PriceBar>) -> Result<Self, DataError> {
        let mut by_ticker: BTreeMap<Ticker, BTreeMap<NaiveDateTime, PriceBar>> = BTreeMap::new();
        for bar in bars {
            bar.validate()?;
            let series = by_ticker.entry(bar.ticker.clone()).or_default();
            if series.contains_key(&bar.timestamp) {
                return Err(DataError::DuplicateBar {
                    ticker: bar.ticker,
                    timestamp: bar.timestamp,
                });
            }
            series.insert(bar.timestamp, bar);
        }
        Ok(Self {
            name: "preset".to_string(),
            frequency,
            bars: by_ticker,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Total number of stored bars across all tickers.
    pub fn bar_count(&self) -> usize {
        self.bars.values().map(BTreeMap::len).sum()
    }
}

impl DataProvider for PresetDataProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn frequency(&self) -> Frequency {
        self.frequency
    }

    fn tickers(&self) -> Vec<Ticker> {
        self.bars.keys().cloned().collect()
    }

    fn get_price(
        &self,
        tickers: &[Ticker],
        fields: &[PriceField],
        start: NaiveDateTime,
        end: NaiveDateTime,
        frequency: Frequency,
    ) -> Result<PriceArray, DataError> {
        if frequency != self.frequency {
            return Err(DataError::FrequencyMismatch {
                requested: frequency,
                available: self.frequency,
            });
        }
        if start > end {
            return Err(DataError::InvalidRange { start, end });
        }

        let mut array = PriceArray::new(fields);
        for ticker in tickers {
            let series = self
                .bars
                .get(ticker)
                .ok_or_else(|| DataError::UnknownTicker {
                    ticker: ticker.clone(),
                })?;
            for bar in series.range(start..=end).map(|(_, bar)| bar) {
                array.insert_bar(bar);
            }
        }
        Ok(array)
    }
}
