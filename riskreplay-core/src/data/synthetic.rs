//! Seeded random-walk bar generator.
//!
//! Each ticker gets its own `StdRng` whose seed is derived from the master
//! seed and the ticker name via BLAKE3, so the path of one ticker does not
//! depend on which other tickers are generated alongside it.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::preset::PresetDataProvider;
use super::provider::DataError;
use crate::domain::{PriceBar, Ticker};
use crate::schedule::{Frequency, MarketHours, TradingCalendar};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub tickers: Vec<Ticker>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub market_hours: MarketHours,
    #[serde(default)]
    pub calendar: TradingCalendar,
    #[serde(default = "default_initial_price")]
    pub initial_price: f64,
    /// Maximum absolute per-bar log return.
    #[serde(default = "default_volatility")]
    pub volatility: f64,
    #[serde(default)]
    pub drift: f64,
    #[serde(default)]
    pub seed: u64,
}

fn default_initial_price() -> f64 {
    100.0
}

fn default_volatility() -> f64 {
    0.02
}

/// Derive a per-ticker seed from the master seed.
pub fn ticker_seed(master_seed: u64, ticker: &str) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&master_seed.to_le_bytes());
    hasher.update(ticker.as_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Generate a random-walk bar set and wrap it in a [`PresetDataProvider`].
///
/// Daily framing stamps one bar per session at midnight; minute framing stamps
/// bars from the open up to one step before the close.
pub fn random_walk(config: &SyntheticConfig) -> Result<PresetDataProvider, DataError> {
    let start = config.start.and_hms_opt(0, 0, 0).unwrap_or_default();
    let end = config.end.and_hms_opt(0, 0, 0).unwrap_or_default();
    if start > end {
        return Err(DataError::InvalidRange { start, end });
    }

    let step = config.frequency.time_delta();
    let mut bars = Vec::new();
    for ticker in &config.tickers {
        let mut rng = StdRng::seed_from_u64(ticker_seed(config.seed, ticker));
        let mut last_close = config.initial_price;

        for day in config.start.iter_days().take_while(|d| *d <= config.end) {
            if !config.calendar.is_session(day) {
                continue;
            }
            let stamps = if config.frequency.is_intraday() {
                let close = day.and_time(config.market_hours.close);
                let mut t = day.and_time(config.market_hours.open);
                let mut stamps = Vec::new();
                while t < close {
                    stamps.push(t);
                    t += step;
                }
                stamps
            } else {
                vec![day.and_hms_opt(0, 0, 0).unwrap_or_default()]
            };

            for timestamp in stamps {
                let open = last_close;
                let ret = config.drift + config.volatility * rng.gen_range(-1.0..=1.0);
                let close = open * ret.exp();
                let high = open.max(close) * (1.0 + config.volatility * rng.gen::<f64>() * 0.5);
                let low = open.min(close) * (1.0 - config.volatility * rng.gen::<f64>() * 0.5);
                let volume = rng.gen_range(1_000.0..100_000.0_f64).round();
                bars.push(PriceBar::new(
                    ticker.clone(),
                    timestamp,
                    open,
                    high,
                    low,
                    close,
                    volume,
                ));
                last_close = close;
            }
        }
    }

    log::debug!(
        "synthetic: {} bars for {} tickers (seed {})",
        bars.len(),
        config.tickers.len(),
        config.seed
    );
    Ok(PresetDataProvider::new(config.frequency, bars)?.with_name("synthetic"))
}
