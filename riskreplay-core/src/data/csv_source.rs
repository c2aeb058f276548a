//! CSV file provider.
//!
//! Expected header: `timestamp,ticker,open,high,low,close,volume`. Timestamps
//! are `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`, or a bare `YYYY-MM-DD`
//! (stamped at midnight, the convention for daily bars).

use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use super::preset::PresetDataProvider;
use super::provider::{DataError, DataProvider, PriceArray};
use crate::domain::{PriceBar, PriceField, Ticker};
use crate::schedule::Frequency;

#[derive(Debug, Deserialize)]
struct CsvRecord {
    timestamp: String,
    ticker: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Parse any of the accepted timestamp layouts.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Bars loaded once from a CSV source and served from memory.
#[derive(Debug, Clone)]
pub struct CsvDataProvider {
    inner: PresetDataProvider,
}

impl CsvDataProvider {
    pub fn from_path(path: &Path, frequency: Frequency) -> Result<Self, DataError> {
        let file = std::fs::File::open(path)?;
        let provider = Self::from_reader(file, frequency)?;
        log::info!(
            "loaded {} bars from {}",
            provider.inner.bar_count(),
            path.display()
        );
        Ok(provider)
    }

    pub fn from_reader<R: Read>(reader: R, frequency: Frequency) -> Result<Self, DataError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut bars = Vec::new();
        for (idx, record) in rdr.deserialize::<CsvRecord>().enumerate() {
            let record = record?;
            let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| DataError::Parse {
                record: idx + 1,
                message: format!("unrecognised timestamp '{}'", record.timestamp),
            })?;
            bars.push(PriceBar::new(
                record.ticker,
                timestamp,
                record.open,
                record.high,
                record.low,
                record.close,
                record.volume,
            ));
        }

        let inner = PresetDataProvider::new(frequency, bars)?.with_name("csv");
        Ok(Self { inner })
    }
}

impl DataProvider for CsvDataProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn frequency(&self) -> Frequency {
        self.inner.frequency()
    }

    fn tickers(&self) -> Vec<Ticker> {
        self.inner.tickers()
    }

    fn get_price(
        &self,
        tickers: &[Ticker],
        fields: &[PriceField],
        start: NaiveDateTime,
        end: NaiveDateTime,
        frequency: Frequency,
    ) -> Result<PriceArray, DataError> {
        self.inner.get_price(tickers, fields, start, end, frequency)
    }
}
