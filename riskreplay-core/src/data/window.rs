//! Market data window: the per-tick view of prices the engine works from.
//!
//! Holds the current session's bars (fetched once per session) and the last
//! known close per ticker. Marks only move forward: a bar's close becomes the
//! mark once the bar has completed.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::provider::{DataError, DataProvider};
use crate::domain::{Marks, PriceBar, PriceField, Ticker};
use crate::schedule::{Frequency, Tick};

pub struct MarketDataWindow {
    provider: Arc<dyn DataProvider>,
    tickers: Vec<Ticker>,
    frequency: Frequency,
    marks: Marks,
    session: Option<NaiveDate>,
    session_bars: BTreeMap<(Ticker, NaiveDateTime), PriceBar>,
}

impl MarketDataWindow {
    pub fn new(provider: Arc<dyn DataProvider>, tickers: Vec<Ticker>, frequency: Frequency) -> Self {
        Self {
            provider,
            tickers,
            frequency,
            marks: Marks::new(),
            session: None,
            session_bars: BTreeMap::new(),
        }
    }

    /// Seed marks from the closes in `[start - lookback_days, start)`.
    ///
    /// With daily framing the window stops before `start`'s own date, since
    /// that day's bar is not complete yet. Returns the number of seeded tickers.
    pub fn warm_up(&mut self, start: NaiveDateTime, lookback_days: u32) -> Result<usize, DataError> {
        let cutoff = if self.frequency.is_intraday() {
            start
        } else {
            start.date().and_time(NaiveTime::MIN)
        };
        let end = cutoff - Duration::seconds(1);
        let begin = start.date().and_time(NaiveTime::MIN) - Duration::days(i64::from(lookback_days));
        if begin > end {
            return Ok(0);
        }

        let array = self.provider.get_price(
            &self.tickers,
            &[PriceField::Close],
            begin,
            end,
            self.frequency,
        )?;
        for ticker in &self.tickers {
            if let Some((_, close)) = array.series(ticker, PriceField::Close).last() {
                self.marks.insert(ticker.clone(), *close);
            }
        }
        log::debug!(
            "warm-up {begin}..{end}: seeded {}/{} marks",
            self.marks.len(),
            self.tickers.len()
        );
        Ok(self.marks.len())
    }

    /// Make the tick's session current, fetching its bars on first use.
    pub fn advance(&mut self, tick: &Tick) -> Result<(), DataError> {
        if !tick.session || self.session == Some(tick.session_date) {
            return Ok(());
        }

        let begin = tick.session_date.and_time(NaiveTime::MIN);
        let end = begin + Duration::days(1) - Duration::seconds(1);
        let array = self.provider.get_price(
            &self.tickers,
            &PriceField::ohlcv(),
            begin,
            end,
            self.frequency,
        )?;

        self.session_bars.clear();
        for ticker in &self.tickers {
            for bar in array.bars(ticker) {
                bar.validate()?;
                self.session_bars.insert((ticker.clone(), bar.timestamp), bar);
            }
        }
        self.session = Some(tick.session_date);
        log::trace!(
            "session {}: {} bars loaded",
            tick.session_date,
            self.session_bars.len()
        );
        Ok(())
    }

    /// Bar of the current session stamped at `timestamp`.
    pub fn bar(&self, ticker: &str, timestamp: NaiveDateTime) -> Option<&PriceBar> {
        self.session_bars.get(&(ticker.to_string(), timestamp))
    }

    pub fn mark(&self, ticker: &str) -> Option<f64> {
        self.marks.get(ticker).copied()
    }

    pub fn marks(&self) -> &Marks {
        &self.marks
    }

    pub fn update_mark(&mut self, ticker: &str, price: f64) {
        self.marks.insert(ticker.to_string(), price);
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PresetDataProvider;
    use crate::schedule::TickKind;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2015, 1, d).unwrap()
    }

    fn provider() -> Arc<dyn DataProvider> {
        let bars = [(2, 110.0), (5, 120.0), (6, 130.0)]
            .iter()
            .map(|(d, c)| {
                PriceBar::new("AAPL", day(*d).and_hms_opt(0, 0, 0).unwrap(), *c, c + 2.0, c - 2.0, *c, 1.0)
            })
            .collect();
        Arc::new(PresetDataProvider::new(Frequency::Daily, bars).unwrap())
    }

    #[test]
    fn warm_up_excludes_start_day() {
        let mut window = MarketDataWindow::new(provider(), vec!["AAPL".into()], Frequency::Daily);
        let seeded = window.warm_up(day(5).and_hms_opt(0, 0, 0).unwrap(), 10).unwrap();
        assert_eq!(seeded, 1);
        assert_eq!(window.mark("AAPL"), Some(110.0));
    }

    #[test]
    fn warm_up_without_history_seeds_nothing() {
        let mut window = MarketDataWindow::new(provider(), vec!["AAPL".into()], Frequency::Daily);
        assert_eq!(window.warm_up(day(2).and_hms_opt(0, 0, 0).unwrap(), 5).unwrap(), 0);
        assert_eq!(window.mark("AAPL"), None);
    }

    #[test]
    fn advance_loads_session_bars() {
        let mut window = MarketDataWindow::new(provider(), vec!["AAPL".into()], Frequency::Daily);
        let tick = Tick {
            timestamp: day(6).and_hms_opt(13, 30, 0).unwrap(),
            kind: TickKind::Open,
            session_date: day(6),
            session: true,
        };
        window.advance(&tick).unwrap();
        let bar = window.bar("AAPL", day(6).and_hms_opt(0, 0, 0).unwrap()).unwrap();
        assert_eq!(bar.open, 130.0);
        assert!(window.bar("AAPL", day(5).and_hms_opt(0, 0, 0).unwrap()).is_none());
    }

    #[test]
    fn unknown_ticker_surfaces_data_error() {
        let mut window = MarketDataWindow::new(provider(), vec!["MSFT".into()], Frequency::Daily);
        let tick = Tick {
            timestamp: day(6).and_hms_opt(13, 30, 0).unwrap(),
            kind: TickKind::Open,
            session_date: day(6),
            session: true,
        };
        assert!(matches!(
            window.advance(&tick),
            Err(DataError::UnknownTicker { .. })
        ));
    }
}
