//! Column primitives over `f64` series
//!
//! Missing values are `NaN` while computing and become `None` at the
//! serialization boundary. Rolling windows count only finite observations
//! towards `min_periods`, so a window with gaps still produces a value once
//! enough real data is present.

use crate::error::{Result, StockError};
use ta::Next;
use ta::indicators::ExponentialMovingAverage;

/// Finite values of the trailing window ending at `i`
fn window_values(values: &[f64], i: usize, window: usize) -> impl Iterator<Item = f64> + '_ {
    let start = (i + 1).saturating_sub(window);
    values[start..=i].iter().copied().filter(|v| v.is_finite())
}

fn rolling<F>(values: &[f64], window: usize, min_periods: usize, reduce: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let min_periods = min_periods.max(1);
    let mut buffer = Vec::with_capacity(window);

    (0..values.len())
        .map(|i| {
            buffer.clear();
            buffer.extend(window_values(values, i, window));
            if buffer.len() >= min_periods {
                reduce(&buffer)
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Rolling arithmetic mean
pub fn rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling(values, window, min_periods, |w| {
        w.iter().sum::<f64>() / w.len() as f64
    })
}

/// Rolling sample standard deviation (n - 1 denominator)
pub fn rolling_std(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling(values, window, min_periods.max(2), |w| {
        let n = w.len() as f64;
        let mean = w.iter().sum::<f64>() / n;
        let var = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        var.sqrt()
    })
}

/// Rolling minimum
pub fn rolling_min(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling(values, window, min_periods, |w| {
        w.iter().copied().fold(f64::INFINITY, f64::min)
    })
}

/// Rolling maximum
pub fn rolling_max(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling(values, window, min_periods, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

/// `values[t] / values[t - periods] - 1`
pub fn pct_change(values: &[f64], periods: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if i < periods || periods == 0 {
                f64::NAN
            } else {
                safe_div(values[i], values[i - periods]) - 1.0
            }
        })
        .collect()
}

/// First difference; the first element is `NaN`
pub fn diff(values: &[f64]) -> Vec<f64> {
    (0..values.len())
        .map(|i| if i == 0 { f64::NAN } else { values[i] - values[i - 1] })
        .collect()
}

/// Non-adjusted exponential moving average with `alpha = 2 / (span + 1)`.
///
/// The first finite value seeds the average. Non-finite inputs carry the
/// previous output forward instead of poisoning the recursion.
pub fn ewm_span(values: &[f64], span: usize) -> Result<Vec<f64>> {
    let mut ema = ExponentialMovingAverage::new(span)
        .map_err(|e| StockError::IndicatorError(format!("EMA({span}): {e}")))?;
    let mut last = f64::NAN;

    Ok(values
        .iter()
        .map(|&value| {
            if value.is_finite() {
                last = ema.next(value);
            }
            last
        })
        .collect())
}

/// Non-adjusted EWM expressed by center of mass, `alpha = 1 / (1 + com)`.
///
/// Equivalent to a span of `2 * com + 1`.
pub fn ewm_com(values: &[f64], com: usize) -> Result<Vec<f64>> {
    ewm_span(values, 2 * com + 1)
}

/// Division that yields `NaN` instead of infinities
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        f64::NAN
    } else {
        numerator / denominator
    }
}

/// `NaN` and infinities become `None`
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
