//! Indicator helpers over bar history.
//!
//! Each function returns the value at the last bar, or `None` when the
//! history is too short or contains a NaN in the window.

use crate::domain::PriceBar;

/// Mean of the last `period` values.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    if window.iter().any(|v| v.is_nan()) {
        return None;
    }
    Some(window.iter().sum::<f64>() / period as f64)
}

/// True range per bar. The first bar has no previous close and uses high-low.
pub fn true_range(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let hl = bar.high - bar.low;
            match i.checked_sub(1).map(|p| bars[p].close) {
                Some(pc) => hl.max((bar.high - pc).abs()).max((bar.low - pc).abs()),
                None => hl,
            }
        })
        .collect()
}

/// Wilder-smoothed ATR (alpha = 1/period), seeded with the mean of the first
/// `period` proper true ranges.
pub fn atr(bars: &[PriceBar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period + 1 {
        return None;
    }
    let tr = true_range(bars);
    let proper = &tr[1..];
    let mut value = sma(&proper[..period], period)?;
    let alpha = 1.0 / period as f64;
    for x in &proper[period..] {
        if x.is_nan() {
            return None;
        }
        value = alpha * x + (1.0 - alpha) * value;
    }
    Some(value)
}
