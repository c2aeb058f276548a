//! End-to-end stop-loss fixture.
//!
//! One ticker, business days 2014-12-25 .. 2015-02-28, bar `i` (0 = Dec 25):
//! open 100+5i, high 106+5i, low 97+5i, close 103+5i. Lows are knocked down on
//! Feb 5, Feb 12, Feb 13 (-15) and Feb 23 (-25, opening at the low) so the 5%
//! stop of a constant long model fires four times, once through a gap.
//!
//! The same price path is replayed with daily bars and with minute bars; both
//! framings must produce the same transactions and equity curve.

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use riskreplay_core::data::{DataProvider, PresetDataProvider};
use riskreplay_core::domain::{PriceBar, TransactionOrigin};
use riskreplay_core::engine::{Backtest, EngineConfig, RunResult};
use riskreplay_core::model::{ConstantExposureModel, ModelBindings};
use riskreplay_core::schedule::{Frequency, ScheduleConfig};

const TICKER: &str = "AAPL US Equity";

const EXPECTED_QUANTITIES: [f64; 14] = [
    8130.0, -127.0, 1.0, -8004.0, 7454.0, -58.0, -7396.0, 6900.0, -6900.0, 6390.0, -44.0,
    -6346.0, 5718.0, -36.0,
];

const EXPECTED_PRICES: [f64; 14] = [
    125.0, 130.0, 135.0, 235.6, 255.0, 260.0, 259.35, 280.0, 264.1, 285.0, 290.0, 282.0, 315.0,
    320.0,
];

const EXPECTED_EQUITY: [f64; 59] = [
    1024390.0, 1064659.0, 1064659.0, 1064659.0, 1104677.0, 1144697.0, 1184717.0, 1224737.0,
    1264757.0, 1264757.0, 1264757.0, 1304777.0, 1344797.0, 1384817.0, 1424837.0, 1464857.0,
    1464857.0, 1464857.0, 1504877.0, 1544897.0, 1584917.0, 1624937.0, 1664957.0, 1664957.0,
    1664957.0, 1704977.0, 1744997.0, 1785017.0, 1825037.0, 1865057.0, 1865057.0, 1865057.0,
    1905077.0, 1945097.0, 1985117.0, 1885867.4, 1908229.4, 1908229.4, 1908229.4, 1945325.4,
    1982305.4, 2019285.4, 1918330.0, 1808620.0, 1808620.0, 1808620.0, 1827790.0, 1859608.0,
    1891338.0, 1923068.0, 1954798.0, 1954798.0, 1954798.0, 1789802.0, 1806956.0, 1835438.0,
    1863848.0, 1892258.0, 1892258.0,
];

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(d: NaiveDate, h: u32, min: u32) -> NaiveDateTime {
    d.and_hms_opt(h, min, 0).unwrap()
}

fn business_days() -> Vec<NaiveDate> {
    date(2014, 12, 25)
        .iter_days()
        .take_while(|d| *d <= date(2015, 2, 28))
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

/// (open, high, low, close, volume) of the daily bar for business day `i`.
fn daily_values(i: usize, day: NaiveDate) -> (f64, f64, f64, f64, f64) {
    let base = 5.0 * i as f64;
    let (mut open, high, mut low, close, volume) =
        (100.0 + base, 106.0 + base, 97.0 + base, 103.0 + base, 104.0 + base);
    if day == date(2015, 2, 5) || day == date(2015, 2, 12) || day == date(2015, 2, 13) {
        low -= 15.0;
    }
    if day == date(2015, 2, 23) {
        low -= 25.0;
        open = low;
    }
    (open, high, low, close, volume)
}

fn daily_bars() -> Vec<PriceBar> {
    business_days()
        .into_iter()
        .enumerate()
        .map(|(i, day)| {
            let (o, h, l, c, v) = daily_values(i, day);
            PriceBar::new(TICKER, at(day, 0, 0), o, h, l, c, v)
        })
        .collect()
}

/// Two minute bars per session: a quiet one at the open and one just before
/// the close carrying the day's full range.
fn minute_bars() -> Vec<PriceBar> {
    business_days()
        .into_iter()
        .enumerate()
        .flat_map(|(i, day)| {
            let base = 5.0 * i as f64;
            let (o, h, l, c, v) = daily_values(i, day);
            vec![
                PriceBar::new(TICKER, at(day, 13, 30), 100.0 + base, 101.0 + base, 100.0 + base, 101.0 + base, 1.0),
                PriceBar::new(TICKER, at(day, 19, 59), o, h, l, c, v),
            ]
        })
        .collect()
}

fn run(frequency: Frequency, bars: Vec<PriceBar>) -> RunResult {
    let provider: Arc<dyn DataProvider> = Arc::new(PresetDataProvider::new(frequency, bars).unwrap());
    let schedule = ScheduleConfig::new(
        at(date(2015, 1, 1), 0, 0),
        date(2015, 2, 28).and_hms_opt(23, 59, 59).unwrap(),
        frequency,
    );
    let config = EngineConfig::new(schedule, 1_000_000.0).with_stop_losses(true);
    let bindings = ModelBindings::new().bind(
        Box::new(ConstantExposureModel::long(0.05)),
        vec![TICKER.to_string()],
    );
    Backtest::new(config, provider, bindings).run().unwrap()
}

fn assert_matches_fixture(result: &RunResult) {
    let quantities: Vec<f64> = result.transactions.iter().map(|t| t.quantity).collect();
    assert_eq!(quantities, EXPECTED_QUANTITIES.to_vec());

    assert_eq!(result.transactions.len(), EXPECTED_PRICES.len());
    for (tx, expected) in result.transactions.iter().zip(EXPECTED_PRICES) {
        assert!(
            (tx.price - expected).abs() < 1e-6,
            "price {} != {} at {}",
            tx.price,
            expected,
            tx.timestamp
        );
    }

    assert_eq!(result.equity_curve.len(), EXPECTED_EQUITY.len());
    for (point, expected) in result.equity_curve.iter().zip(EXPECTED_EQUITY) {
        assert!(
            (point.equity - expected).abs() < 1e-6,
            "equity {} != {} on {}",
            point.equity,
            expected,
            point.timestamp
        );
    }
}

// ──────────────────────────────────────────────
// Daily framing
// ──────────────────────────────────────────────

#[test]
fn daily_fixture_matches_expected_ledger() {
    let result = run(Frequency::Daily, daily_bars());
    assert_matches_fixture(&result);
}

#[test]
fn daily_equity_is_one_point_per_calendar_day() {
    let result = run(Frequency::Daily, daily_bars());
    let days: Vec<NaiveDate> = result.equity_curve.iter().map(|p| p.timestamp.date()).collect();
    let expected: Vec<NaiveDate> = (0..59).map(|i| date(2015, 1, 1) + Duration::days(i)).collect();
    assert_eq!(days, expected);
}

#[test]
fn stop_exits_are_stamped_at_the_close_and_entries_at_the_open() {
    let result = run(Frequency::Daily, daily_bars());
    let stop_indices: Vec<usize> = result
        .transactions
        .iter()
        .enumerate()
        .filter(|(_, t)| t.origin == TransactionOrigin::StopLoss)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(stop_indices, vec![3, 6, 8, 11]);

    for tx in &result.transactions {
        let expected_time = match tx.origin {
            TransactionOrigin::StopLoss => at(tx.timestamp.date(), 20, 0),
            TransactionOrigin::Signal => at(tx.timestamp.date(), 13, 30),
        };
        assert_eq!(tx.timestamp, expected_time);
    }
}

#[test]
fn gap_down_fills_at_the_open() {
    let result = run(Frequency::Daily, daily_bars());
    let gap = &result.transactions[11];
    assert_eq!(gap.timestamp.date(), date(2015, 2, 23));
    assert_eq!(gap.origin, TransactionOrigin::StopLoss);
    // stop 298 * 0.95 = 283.1, bar opened at 282
    assert_eq!(gap.price, 282.0);
}

#[test]
fn one_exit_for_consecutive_breaching_bars() {
    // Feb 12 and Feb 13 both breach; Feb 12's stop fires once, the Feb 13
    // exit belongs to the position re-entered at Feb 13's open.
    let result = run(Frequency::Daily, daily_bars());
    let per_day = |d: NaiveDate| {
        result
            .transactions
            .iter()
            .filter(|t| t.origin == TransactionOrigin::StopLoss && t.timestamp.date() == d)
            .count()
    };
    assert_eq!(per_day(date(2015, 2, 12)), 1);
    assert_eq!(per_day(date(2015, 2, 13)), 1);
}

#[test]
fn ledger_ends_consistent() {
    let result = run(Frequency::Daily, daily_bars());
    let held: f64 = EXPECTED_QUANTITIES.iter().sum();
    assert_eq!(result.final_positions.len(), 1);
    assert_eq!(result.final_positions[0].quantity, held);

    let cash: f64 = 1_000_000.0
        - result
            .transactions
            .iter()
            .map(|t| t.quantity * t.price)
            .sum::<f64>();
    assert!((result.final_cash - cash).abs() < 1e-6);

    // last close: Feb 27 is business day 46
    let last_close = 103.0 + 5.0 * 46.0;
    assert!((result.final_equity() - (cash + held * last_close)).abs() < 1e-6);
}

// ──────────────────────────────────────────────
// Minute framing
// ──────────────────────────────────────────────

#[test]
fn minute_fixture_matches_expected_ledger() {
    let result = run(Frequency::Min1, minute_bars());
    assert_matches_fixture(&result);
}

#[test]
fn framings_agree_exactly() {
    let daily = run(Frequency::Daily, daily_bars());
    let minute = run(Frequency::Min1, minute_bars());
    assert_eq!(daily.transactions, minute.transactions);
    assert_eq!(daily.equity_curve, minute.equity_curve);
    assert_eq!(daily.fingerprint().unwrap(), minute.fingerprint().unwrap());
    assert!(minute.tick_count > daily.tick_count);
}
