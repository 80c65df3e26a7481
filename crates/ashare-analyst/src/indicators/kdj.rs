//! Weekly KDJ stochastic oscillator on forward-adjusted prices
//!
//! RSV = 100 * (close - low9) / (high9 - low9), zero on a flat range.
//! K = EWM(RSV, com = 2), D = EWM(K, com = 2), J = 3K - 2D.

use super::series::{ewm_com, finite, rolling_max, rolling_min};
use crate::error::Result;
use crate::models::{WeeklyBar, sort_by_date};
use serde::{Deserialize, Serialize};

/// RSV lookback in weeks
pub const KDJ_WINDOW: usize = 9;

/// Smoothing center of mass for K and D
pub const KDJ_COM: usize = 2;

/// K/D crossover between two consecutive weeks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KdjCross {
    /// K moved from below D to above it
    #[serde(rename = "Golden Cross")]
    GoldenCross,
    /// K moved from above D to below it
    #[serde(rename = "Dead Cross")]
    DeadCross,
    #[default]
    None,
}

impl KdjCross {
    /// Compare the previous and current K/D ordering.
    ///
    /// Both inequalities are strict; a week where K equals D never starts
    /// or completes a cross.
    pub fn detect(prev_k: f64, prev_d: f64, k: f64, d: f64) -> Self {
        if prev_k < prev_d && k > d {
            Self::GoldenCross
        } else if prev_k > prev_d && k < d {
            Self::DeadCross
        } else {
            Self::None
        }
    }
}

/// One weekly bar annotated with its oscillator state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyKdjRow {
    pub trade_date: String,
    pub close_qfq: Option<f64>,
    pub rsv: Option<f64>,
    pub k: Option<f64>,
    pub d: Option<f64>,
    pub j: Option<f64>,
    pub kdj_cross: KdjCross,
}

/// Latest weekly oscillator values broadcast onto the daily series
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeeklyKdjSnapshot {
    pub signal: KdjCross,
    pub k: Option<f64>,
    pub d: Option<f64>,
    pub j: Option<f64>,
}

impl WeeklyKdjSnapshot {
    /// State of the most recent week, if any
    pub fn latest(rows: &[WeeklyKdjRow]) -> Option<Self> {
        rows.last().map(|row| Self {
            signal: row.kdj_cross,
            k: row.k,
            d: row.d,
            j: row.j,
        })
    }
}

/// Raw stochastic value guarded against a flat range
pub fn rsv(close: f64, low: f64, high: f64) -> f64 {
    let range = high - low;
    if range == 0.0 {
        0.0
    } else {
        (close - low) / range * 100.0
    }
}

/// Annotate weekly bars with K, D, J and crossover labels.
///
/// Bars are sorted by trade date first; an empty input gives an empty output.
pub fn compute_weekly_kdj(bars: &[WeeklyBar]) -> Result<Vec<WeeklyKdjRow>> {
    if bars.is_empty() {
        return Ok(Vec::new());
    }

    let mut bars = bars.to_vec();
    sort_by_date(&mut bars);

    let lows: Vec<f64> = bars.iter().map(|b| b.low_qfq.unwrap_or(f64::NAN)).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high_qfq.unwrap_or(f64::NAN)).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close_qfq.unwrap_or(f64::NAN)).collect();

    let low_n = rolling_min(&lows, KDJ_WINDOW, 1);
    let high_n = rolling_max(&highs, KDJ_WINDOW, 1);

    let rsv_values: Vec<f64> = closes
        .iter()
        .zip(low_n.iter().zip(&high_n))
        .map(|(&close, (&low, &high))| rsv(close, low, high))
        .collect();

    let k = ewm_com(&rsv_values, KDJ_COM)?;
    let d = ewm_com(&k, KDJ_COM)?;
    let j: Vec<f64> = k.iter().zip(&d).map(|(k, d)| 3.0 * k - 2.0 * d).collect();

    Ok(bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let kdj_cross = if i == 0 {
                KdjCross::None
            } else {
                KdjCross::detect(k[i - 1], d[i - 1], k[i], d[i])
            };

            WeeklyKdjRow {
                trade_date: bar.trade_date.clone(),
                close_qfq: bar.close_qfq,
                rsv: finite(rsv_values[i]),
                k: finite(k[i]),
                d: finite(d[i]),
                j: finite(j[i]),
                kdj_cross,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(i: usize, low: f64, high: f64, close: f64) -> WeeklyBar {
        WeeklyBar {
            ts_code: "600519.SH".to_string(),
            trade_date: format!("2023{:02}{:02}", 1 + i / 28, 1 + i % 28),
            low_qfq: Some(low),
            high_qfq: Some(high),
            close_qfq: Some(close),
            ..Default::default()
        }
    }

    #[test]
    fn test_rsv_flat_range_is_zero() {
        assert_eq!(rsv(10.0, 10.0, 10.0), 0.0);
        assert_eq!(rsv(f64::NAN, 5.0, 5.0), 0.0);
        assert_eq!(rsv(15.0, 10.0, 20.0), 50.0);
    }

    #[test]
    fn test_detect_cross() {
        assert_eq!(KdjCross::detect(10.0, 20.0, 30.0, 25.0), KdjCross::GoldenCross);
        assert_eq!(KdjCross::detect(30.0, 25.0, 10.0, 20.0), KdjCross::DeadCross);
        assert_eq!(KdjCross::detect(10.0, 20.0, 15.0, 25.0), KdjCross::None);
        assert_eq!(KdjCross::detect(20.0, 20.0, 30.0, 25.0), KdjCross::None);
        assert_eq!(KdjCross::detect(f64::NAN, 20.0, 30.0, 25.0), KdjCross::None);
    }

    #[test]
    fn test_swapping_order_flips_label() {
        let golden = KdjCross::detect(1.0, 2.0, 3.0, 2.5);
        let dead = KdjCross::detect(2.0, 1.0, 2.5, 3.0);
        assert_eq!(golden, KdjCross::GoldenCross);
        assert_eq!(dead, KdjCross::DeadCross);
    }

    #[test]
    fn test_cross_serializes_with_spaces() {
        assert_eq!(
            serde_json::to_string(&KdjCross::GoldenCross).unwrap(),
            "\"Golden Cross\""
        );
        assert_eq!(serde_json::to_string(&KdjCross::None).unwrap(), "\"None\"");
        assert_eq!(
            serde_json::to_string(&KdjCross::DeadCross).unwrap(),
            "\"Dead Cross\""
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(compute_weekly_kdj(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_flat_series_has_zero_rsv() {
        let bars: Vec<WeeklyBar> = (0..12).map(|i| bar(i, 10.0, 10.0, 10.0)).collect();
        let rows = compute_weekly_kdj(&bars).unwrap();
        assert!(rows.iter().all(|r| r.rsv == Some(0.0)));
        assert!(rows.iter().all(|r| r.kdj_cross == KdjCross::None));
        assert_eq!(rows.last().unwrap().j, Some(0.0));
    }

    #[test]
    fn test_first_week_values() {
        let rows = compute_weekly_kdj(&[bar(0, 9.0, 11.0, 10.0)]).unwrap();
        assert_eq!(rows[0].rsv, Some(50.0));
        assert_eq!(rows[0].k, Some(50.0));
        assert_eq!(rows[0].d, Some(50.0));
        assert_eq!(rows[0].j, Some(50.0));
        assert_eq!(rows[0].kdj_cross, KdjCross::None);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let bars = vec![bar(2, 9.0, 11.0, 11.0), bar(0, 9.0, 11.0, 9.0), bar(1, 9.0, 11.0, 10.0)];
        let rows = compute_weekly_kdj(&bars).unwrap();
        let dates: Vec<&str> = rows.iter().map(|r| r.trade_date.as_str()).collect();
        assert_eq!(dates, vec!["20230101", "20230102", "20230103"]);
        assert_eq!(rows[0].rsv, Some(0.0));
    }

    #[test]
    fn test_snapshot_uses_last_row() {
        let bars: Vec<WeeklyBar> = (0..3)
            .map(|i| bar(i, 9.0, 11.0, 9.0 + i as f64))
            .collect();
        let rows = compute_weekly_kdj(&bars).unwrap();
        let snapshot = WeeklyKdjSnapshot::latest(&rows).unwrap();
        assert_eq!(snapshot.k, rows[2].k);
        assert_eq!(snapshot.signal, rows[2].kdj_cross);
        assert!(WeeklyKdjSnapshot::latest(&[]).is_none());
    }
}
