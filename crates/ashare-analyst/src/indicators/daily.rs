//! Daily indicator engine
//!
//! Computes the full indicator frame over ascending daily quotes, then
//! projects the columns handed to the report writer.

use super::kdj::{KdjCross, WeeklyKdjSnapshot};
use super::series::{
    diff, ewm_span, finite, pct_change, rolling_mean, rolling_std, safe_div,
};
use crate::error::Result;
use crate::models::{DailyQuote, MoneyFlow, sort_by_date};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Return horizons in trading days
pub const RETURN_PERIODS: [usize; 4] = [20, 60, 120, 240];

/// Simple moving average windows
pub const MA_WINDOWS: [usize; 5] = [5, 10, 20, 50, 200];

const RSI_PERIOD: usize = 14;
const BOLLINGER_WINDOW: usize = 20;
const BOLLINGER_MIN_PERIODS: usize = 10;
const BOLLINGER_K: f64 = 2.0;

/// Observations a moving average needs: 80% of the window, rounded up
pub fn ma_min_periods(window: usize) -> usize {
    (window * 4).div_ceil(5)
}

/// Every computed column for one trading day.
///
/// Undefined values (warm-up periods, guarded divisions) are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyIndicatorRow {
    pub trade_date: String,
    pub close: f64,
    pub vol: f64,
    pub returns_20d: Option<f64>,
    pub returns_60d: Option<f64>,
    pub returns_120d: Option<f64>,
    pub returns_240d: Option<f64>,
    pub ma_5: Option<f64>,
    pub ma_10: Option<f64>,
    pub ma_20: Option<f64>,
    pub ma_50: Option<f64>,
    pub ma_200: Option<f64>,
    pub volatility_20d: Option<f64>,
    pub volatility_60d: Option<f64>,
    pub volume_ma_20: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub ema_12: Option<f64>,
    pub ema_26: Option<f64>,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub rsi_14: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_width: Option<f64>,
    pub bb_breakout: i8,
    pub net_mf_amount: Option<f64>,
    pub net_mf_amount_ma_5: Option<f64>,
    pub net_mf_amount_ma_20: Option<f64>,
    pub weekly_kdj_signal: KdjCross,
    pub weekly_k_latest: Option<f64>,
    pub weekly_d_latest: Option<f64>,
    pub weekly_j_latest: Option<f64>,
}

/// Column projection sent downstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub trade_date: String,
    pub close: f64,
    pub volume_ratio: Option<f64>,
    pub macd_hist: Option<f64>,
    pub rsi_14: Option<f64>,
    pub bb_width: Option<f64>,
    pub bb_breakout: i8,
    pub net_mf_amount_ma_5: Option<f64>,
    pub weekly_kdj_signal: KdjCross,
    pub weekly_k_latest: Option<f64>,
    pub weekly_d_latest: Option<f64>,
    pub weekly_j_latest: Option<f64>,
}

impl From<&DailyIndicatorRow> for IndicatorRow {
    fn from(row: &DailyIndicatorRow) -> Self {
        Self {
            trade_date: row.trade_date.clone(),
            close: row.close,
            volume_ratio: row.volume_ratio,
            macd_hist: row.macd_hist,
            rsi_14: row.rsi_14,
            bb_width: row.bb_width,
            bb_breakout: row.bb_breakout,
            net_mf_amount_ma_5: row.net_mf_amount_ma_5,
            weekly_kdj_signal: row.weekly_kdj_signal,
            weekly_k_latest: row.weekly_k_latest,
            weekly_d_latest: row.weekly_d_latest,
            weekly_j_latest: row.weekly_j_latest,
        }
    }
}

/// RSI from simple rolling means of one-sided deltas.
///
/// `NaN` wherever the average loss is zero.
pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let delta = diff(closes);
    let gains: Vec<f64> = delta.iter().map(|&d| if d > 0.0 { d } else { 0.0 }).collect();
    let losses: Vec<f64> = delta.iter().map(|&d| if d < 0.0 { -d } else { 0.0 }).collect();

    let avg_gain = rolling_mean(&gains, period, period);
    let avg_loss = rolling_mean(&losses, period, period);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(&gain, &loss)| {
            let rs = safe_div(gain, loss);
            100.0 - 100.0 / (1.0 + rs)
        })
        .collect()
}

/// Price position against the bands: 1 above, -1 below, 0 otherwise
pub fn breakout(close: f64, upper: f64, lower: f64) -> i8 {
    if close > upper {
        1
    } else if close < lower {
        -1
    } else {
        0
    }
}

/// Compute the full indicator frame.
///
/// Quotes are sorted ascending by trade date; money flow is left-joined on
/// trade date. An empty quote series gives an empty frame.
pub fn compute_daily_indicators(
    quotes: &[DailyQuote],
    moneyflows: &[MoneyFlow],
    weekly: Option<&WeeklyKdjSnapshot>,
) -> Result<Vec<DailyIndicatorRow>> {
    if quotes.is_empty() {
        return Ok(Vec::new());
    }

    let mut quotes = quotes.to_vec();
    sort_by_date(&mut quotes);

    let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
    let volumes: Vec<f64> = quotes.iter().map(|q| q.vol).collect();

    let returns: Vec<Vec<f64>> = RETURN_PERIODS
        .iter()
        .map(|&period| pct_change(&closes, period))
        .collect();

    let mas: Vec<Vec<f64>> = MA_WINDOWS
        .iter()
        .map(|&window| rolling_mean(&closes, window, ma_min_periods(window)))
        .collect();
    let ma_20 = &mas[2];

    let daily_change = pct_change(&closes, 1);
    let volatility_20 = scale(&rolling_std(&daily_change, 20, 10), 20.0_f64.sqrt());
    let volatility_60 = scale(&rolling_std(&daily_change, 60, 30), 60.0_f64.sqrt());

    let volume_ma_20 = rolling_mean(&volumes, 20, 10);

    let ema_12 = ewm_span(&closes, 12)?;
    let ema_26 = ewm_span(&closes, 26)?;
    let macd: Vec<f64> = ema_12.iter().zip(&ema_26).map(|(a, b)| a - b).collect();
    let signal = ewm_span(&macd, 9)?;

    let rsi_14 = rsi(&closes, RSI_PERIOD);

    let bb_std = rolling_std(&closes, BOLLINGER_WINDOW, BOLLINGER_MIN_PERIODS);

    let flows: HashMap<&str, f64> = moneyflows
        .iter()
        .filter_map(|mf| Some((mf.trade_date.as_str(), mf.net_mf_amount?)))
        .collect();
    let net_mf: Vec<f64> = quotes
        .iter()
        .map(|q| flows.get(q.trade_date.as_str()).copied().unwrap_or(f64::NAN))
        .collect();
    let net_mf_ma_5 = rolling_mean(&net_mf, 5, 3);
    let net_mf_ma_20 = rolling_mean(&net_mf, 20, 10);

    let weekly = weekly.copied().unwrap_or_default();

    Ok(quotes
        .iter()
        .enumerate()
        .map(|(i, quote)| {
            let middle = ma_20[i];
            let upper = middle + BOLLINGER_K * bb_std[i];
            let lower = middle - BOLLINGER_K * bb_std[i];
            let macd_hist = macd[i] - signal[i];

            DailyIndicatorRow {
                trade_date: quote.trade_date.clone(),
                close: quote.close,
                vol: quote.vol,
                returns_20d: finite(returns[0][i]),
                returns_60d: finite(returns[1][i]),
                returns_120d: finite(returns[2][i]),
                returns_240d: finite(returns[3][i]),
                ma_5: finite(mas[0][i]),
                ma_10: finite(mas[1][i]),
                ma_20: finite(middle),
                ma_50: finite(mas[3][i]),
                ma_200: finite(mas[4][i]),
                volatility_20d: finite(volatility_20[i]),
                volatility_60d: finite(volatility_60[i]),
                volume_ma_20: finite(volume_ma_20[i]),
                volume_ratio: finite(safe_div(quote.vol, volume_ma_20[i])),
                ema_12: finite(ema_12[i]),
                ema_26: finite(ema_26[i]),
                macd: finite(macd[i]),
                signal: finite(signal[i]),
                macd_hist: finite(macd_hist),
                rsi_14: finite(rsi_14[i]),
                bb_middle: finite(middle),
                bb_upper: finite(upper),
                bb_lower: finite(lower),
                bb_width: finite(safe_div(upper - lower, middle)),
                bb_breakout: breakout(quote.close, upper, lower),
                net_mf_amount: finite(net_mf[i]),
                net_mf_amount_ma_5: finite(net_mf_ma_5[i]),
                net_mf_amount_ma_20: finite(net_mf_ma_20[i]),
                weekly_kdj_signal: weekly.signal,
                weekly_k_latest: weekly.k,
                weekly_d_latest: weekly.d,
                weekly_j_latest: weekly.j,
            }
        })
        .collect())
}

/// Last `rows` rows of the downstream projection
pub fn project_tail(frame: &[DailyIndicatorRow], rows: usize) -> Vec<IndicatorRow> {
    let start = frame.len().saturating_sub(rows);
    frame[start..].iter().map(IndicatorRow::from).collect()
}

fn scale(values: &[f64], factor: f64) -> Vec<f64> {
    values.iter().map(|v| v * factor).collect()
}
