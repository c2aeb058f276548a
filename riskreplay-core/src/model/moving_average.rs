//! Moving-average crossover model with ATR-scaled risk.
//!
//! Long while the fast SMA of closes is above the slow SMA, short (or out when
//! shorting is disabled) while below. Only bars completed strictly before the
//! simulated "now" are used.

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::indicators::{atr, sma};
use super::{ModelError, SignalModel};
use crate::data::DataProvider;
use crate::domain::{Exposure, PriceBar, PriceField, Ticker};
use crate::schedule::{Frequency, SimTimer};

/// Smallest fraction at risk the model will report.
const MIN_FRACTION: f64 = 1e-4;

/// Upper bound on `slow` and `atr_period`, in bars. Keeps the history span
/// representable as a chrono duration.
pub const MAX_PERIOD: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverageParams {
    pub fast: usize,
    pub slow: usize,
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,
    /// ATR multiple used as the stop distance.
    #[serde(default = "default_risk_factor")]
    pub risk_factor: f64,
    #[serde(default)]
    pub allow_short: bool,
    /// Fraction reported while there is not enough history for the ATR.
    #[serde(default = "default_fallback_fraction")]
    pub fallback_fraction: f64,
}

fn default_atr_period() -> usize {
    14
}

fn default_risk_factor() -> f64 {
    2.0
}

fn default_fallback_fraction() -> f64 {
    0.05
}

impl MovingAverageParams {
    pub fn new(fast: usize, slow: usize) -> Self {
        Self {
            fast,
            slow,
            atr_period: default_atr_period(),
            risk_factor: default_risk_factor(),
            allow_short: false,
            fallback_fraction: default_fallback_fraction(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.fast == 0 || self.fast >= self.slow {
            return Err(ModelError::InvalidParameter(format!(
                "fast period ({}) must be >= 1 and below slow period ({})",
                self.fast, self.slow
            )));
        }
        if self.atr_period == 0 {
            return Err(ModelError::InvalidParameter("atr_period must be >= 1".into()));
        }
        if self.slow > MAX_PERIOD || self.atr_period > MAX_PERIOD {
            return Err(ModelError::InvalidParameter(format!(
                "periods are limited to {MAX_PERIOD} bars (slow {}, atr_period {})",
                self.slow, self.atr_period
            )));
        }
        if !(self.risk_factor.is_finite() && self.risk_factor > 0.0) {
            return Err(ModelError::InvalidParameter(format!(
                "risk_factor must be positive, got {}",
                self.risk_factor
            )));
        }
        if !(self.fallback_fraction > 0.0 && self.fallback_fraction <= 1.0) {
            return Err(ModelError::InvalidParameter(format!(
                "fallback_fraction must be in (0, 1], got {}",
                self.fallback_fraction
            )));
        }
        Ok(())
    }

    /// Bars of history needed for both the slow SMA and the ATR.
    fn bars_needed(&self) -> usize {
        self.slow.max(self.atr_period + 1)
    }
}

pub struct MovingAverageCrossModel {
    params: MovingAverageParams,
    provider: Arc<dyn DataProvider>,
    timer: SimTimer,
    frequency: Frequency,
    tickers: Vec<Ticker>,
}

impl MovingAverageCrossModel {
    pub fn new(
        params: MovingAverageParams,
        provider: Arc<dyn DataProvider>,
        timer: SimTimer,
        frequency: Frequency,
        tickers: Vec<Ticker>,
    ) -> Result<Self, ModelError> {
        params.validate()?;
        Ok(Self {
            params,
            provider,
            timer,
            frequency,
            tickers,
        })
    }

    pub fn params(&self) -> &MovingAverageParams {
        &self.params
    }

    /// Last completed bar stamp allowed at `now`.
    fn history_end(&self, now: NaiveDateTime) -> NaiveDateTime {
        if self.frequency.is_intraday() {
            now - self.frequency.time_delta()
        } else {
            now.date().and_time(NaiveTime::MIN) - Duration::seconds(1)
        }
    }

    /// Calendar span that comfortably holds `bars_needed` bars.
    fn history_span(&self) -> Duration {
        let needed = self.params.bars_needed() as i64;
        if self.frequency.is_intraday() {
            self.frequency.time_delta() * (needed * 4) as i32 + Duration::days(4)
        } else {
            Duration::days(needed * 2 + 10)
        }
    }

    fn history(&self, ticker: &str) -> Result<Vec<PriceBar>, ModelError> {
        if !self.tickers.iter().any(|t| t == ticker) {
            return Err(ModelError::UnknownTicker {
                ticker: ticker.to_string(),
            });
        }
        let now = self.timer.now().ok_or(ModelError::NoClock)?;
        let end = self.history_end(now);
        let start = end - self.history_span();
        let array = self.provider.get_price(
            &[ticker.to_string()],
            &PriceField::ohlcv(),
            start,
            end,
            self.frequency,
        )?;
        let bars = array.bars(ticker);
        let keep = bars.len().saturating_sub(self.params.bars_needed());
        Ok(bars[keep..].to_vec())
    }
}

impl SignalModel for MovingAverageCrossModel {
    fn desired_exposure(&mut self, ticker: &str, current: Exposure) -> Result<Exposure, ModelError> {
        let bars = self.history(ticker)?;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let (fast, slow) = match (sma(&closes, self.params.fast), sma(&closes, self.params.slow)) {
            (Some(f), Some(s)) => (f, s),
            _ => return Ok(Exposure::Out),
        };

        let exposure = if fast > slow {
            Exposure::Long
        } else if fast < slow {
            if self.params.allow_short {
                Exposure::Short
            } else {
                Exposure::Out
            }
        } else {
            current
        };
        log::trace!("{ticker}: sma{}={fast:.4} sma{}={slow:.4} -> {exposure:?}", self.params.fast, self.params.slow);
        Ok(exposure)
    }

    fn fraction_at_risk(&self, ticker: &str) -> Result<f64, ModelError> {
        let bars = self.history(ticker)?;
        let last_close = bars.last().map(|b| b.close);
        match (atr(&bars, self.params.atr_period), last_close) {
            (Some(range), Some(close)) if close > 0.0 => {
                Ok((self.params.risk_factor * range / close).clamp(MIN_FRACTION, 1.0))
            }
            _ => Ok(self.params.fallback_fraction),
        }
    }

    fn name(&self) -> &str {
        "moving_average_cross"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PresetDataProvider;
    use chrono::NaiveDate;

    fn day(i: i64) -> NaiveDateTime {
        (NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(i))
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    /// Daily bars on every calendar day following `closes`.
    fn provider(closes: &[f64]) -> Arc<dyn DataProvider> {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::new("TEST", day(i as i64), c, c + 1.0, c - 1.0, c, 1000.0))
            .collect();
        Arc::new(PresetDataProvider::new(Frequency::Daily, bars).unwrap())
    }

    fn model(closes: &[f64], allow_short: bool) -> (MovingAverageCrossModel, SimTimer) {
        let mut params = MovingAverageParams::new(3, 5);
        params.atr_period = 3;
        params.allow_short = allow_short;
        let timer = SimTimer::new();
        let model = MovingAverageCrossModel::new(
            params,
            provider(closes),
            timer.clone(),
            Frequency::Daily,
            vec!["TEST".into()],
        )
        .unwrap();
        (model, timer)
    }

    fn at_open(i: i64) -> NaiveDateTime {
        day(i) + Duration::hours(13) + Duration::minutes(30)
    }

    #[test]
    fn rising_series_goes_long() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let (mut model, timer) = model(&closes, false);
        timer.set(at_open(10));
        assert_eq!(model.desired_exposure("TEST", Exposure::Out).unwrap(), Exposure::Long);
    }

    #[test]
    fn falling_series_respects_short_flag() {
        let closes: Vec<f64> = (0..20).map(|i| 200.0 - i as f64).collect();
        let (mut long_only, timer) = model(&closes, false);
        timer.set(at_open(10));
        assert_eq!(long_only.desired_exposure("TEST", Exposure::Long).unwrap(), Exposure::Out);

        let (mut both, timer) = model(&closes, true);
        timer.set(at_open(10));
        assert_eq!(both.desired_exposure("TEST", Exposure::Out).unwrap(), Exposure::Short);
    }

    #[test]
    fn same_day_bar_is_not_visible() {
        // Day 5 jumps; at the open of day 5 the model must not see it.
        let mut closes = vec![100.0; 10];
        closes[5] = 500.0;
        let (mut model, timer) = model(&closes, true);
        timer.set(at_open(5));
        // flat history: fast == slow keeps the current exposure
        assert_eq!(model.desired_exposure("TEST", Exposure::Out).unwrap(), Exposure::Out);
        timer.set(at_open(6));
        assert_eq!(model.desired_exposure("TEST", Exposure::Out).unwrap(), Exposure::Long);
    }

    #[test]
    fn short_history_is_out_with_fallback_fraction() {
        let closes = vec![100.0; 3];
        let (mut model, timer) = model(&closes, false);
        timer.set(at_open(2));
        assert_eq!(model.desired_exposure("TEST", Exposure::Long).unwrap(), Exposure::Out);
        assert_eq!(model.fraction_at_risk("TEST").unwrap(), 0.05);
    }

    #[test]
    fn fraction_is_atr_over_close() {
        let closes = vec![100.0; 10];
        let (model, timer) = model(&closes, false);
        timer.set(at_open(8));
        // range 2, risk factor 2, close 100
        let f = model.fraction_at_risk("TEST").unwrap();
        assert!((f - 0.04).abs() < 1e-12);
    }

    #[test]
    fn requires_clock() {
        let (model, _timer) = model(&[100.0; 10], false);
        assert!(matches!(model.fraction_at_risk("TEST"), Err(ModelError::NoClock)));
    }

    #[test]
    fn unbound_ticker_is_error() {
        let (model, timer) = model(&[100.0; 10], false);
        timer.set(at_open(8));
        assert!(matches!(
            model.fraction_at_risk("OTHER"),
            Err(ModelError::UnknownTicker { .. })
        ));
    }

    #[test]
    fn invalid_periods_are_rejected() {
        assert!(MovingAverageParams::new(5, 5).validate().is_err());
        assert!(MovingAverageParams::new(0, 5).validate().is_err());
        assert!(MovingAverageParams::new(2, 5).validate().is_ok());
    }

    #[test]
    fn oversized_periods_are_rejected() {
        assert!(MovingAverageParams::new(5, MAX_PERIOD).validate().is_ok());
        assert!(MovingAverageParams::new(5, MAX_PERIOD + 1).validate().is_err());
        assert!(MovingAverageParams::new(5, usize::MAX).validate().is_err());

        let mut params = MovingAverageParams::new(5, 20);
        params.atr_period = usize::MAX / 2;
        assert!(matches!(
            params.validate(),
            Err(ModelError::InvalidParameter(_))
        ));
    }

    #[test]
    fn largest_periods_fit_the_history_span() {
        let mut params = MovingAverageParams::new(5, MAX_PERIOD);
        params.atr_period = MAX_PERIOD;
        for frequency in [Frequency::Daily, Frequency::Min1, Frequency::Min60] {
            let model = MovingAverageCrossModel::new(
                params.clone(),
                provider(&[100.0; 3]),
                SimTimer::new(),
                frequency,
                vec!["AAA".into()],
            )
            .unwrap();
            assert!(model.history_span() > Duration::zero());
        }
    }
}
