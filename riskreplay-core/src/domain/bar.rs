//! PriceBar: one instrument's OHLCV for one scheduled period.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Ticker;

/// The five fields a data provider can serve for a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl PriceField {
    /// All fields in canonical OHLCV order.
    pub fn ohlcv() -> Vec<PriceField> {
        vec![
            PriceField::Open,
            PriceField::High,
            PriceField::Low,
            PriceField::Close,
            PriceField::Volume,
        ]
    }
}

/// OHLCV bar for a single ticker.
///
/// `timestamp` is the start of the bar's period: a daily bar is stamped at
/// midnight of its session date, a minute bar at the start of its minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub ticker: Ticker,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Why a bar was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar {ticker}@{timestamp} has a non-finite price")]
    NonFinite {
        ticker: Ticker,
        timestamp: NaiveDateTime,
    },
    #[error(
        "bar {ticker}@{timestamp} violates low <= open,close <= high \
         (o={open} h={high} l={low} c={close})"
    )]
    Inconsistent {
        ticker: Ticker,
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },
}

impl PriceBar {
    pub fn new(
        ticker: impl Into<Ticker>,
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Value of a single field.
    pub fn field(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::Volume => self.volume,
        }
    }

    /// Check the OHLC invariants: all prices finite and `low <= open,close <= high`.
    pub fn validate(&self) -> Result<(), BarError> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(BarError::NonFinite {
                ticker: self.ticker.clone(),
                timestamp: self.timestamp,
            });
        }
        let consistent = self.low <= self.open
            && self.low <= self.close
            && self.open <= self.high
            && self.close <= self.high;
        if !consistent {
            return Err(BarError::Inconsistent {
                ticker: self.ticker.clone(),
                timestamp: self.timestamp,
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_bar() -> PriceBar {
        let ts = NaiveDate::from_ymd_opt(2015, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        PriceBar::new("AAPL US Equity", ts, 130.0, 136.0, 127.0, 133.0, 134.0)
    }

    #[test]
    fn sane_bar_validates() {
        assert!(sample_bar().validate().is_ok());
    }

    #[test]
    fn nan_price_is_rejected() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(matches!(bar.validate(), Err(BarError::NonFinite { .. })));
    }

    #[test]
    fn open_below_low_is_rejected() {
        let mut bar = sample_bar();
        bar.open = 120.0;
        assert!(matches!(bar.validate(), Err(BarError::Inconsistent { .. })));
    }

    #[test]
    fn gap_open_at_low_is_valid() {
        let mut bar = sample_bar();
        bar.low = 110.0;
        bar.open = 110.0;
        assert!(bar.validate().is_ok());
    }

    #[test]
    fn field_lookup_matches_struct() {
        let bar = sample_bar();
        assert_eq!(bar.field(PriceField::Open), 130.0);
        assert_eq!(bar.field(PriceField::High), 136.0);
        assert_eq!(bar.field(PriceField::Low), 127.0);
        assert_eq!(bar.field(PriceField::Close), 133.0);
        assert_eq!(bar.field(PriceField::Volume), 134.0);
    }
}
