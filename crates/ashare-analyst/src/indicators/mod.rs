//! Locally computed technical indicators
//!
//! - `series`: rolling windows, percent change, exponential smoothing
//! - `kdj`: weekly KDJ oscillator with crossover detection
//! - `daily`: daily indicator frame and its downstream projection

pub mod daily;
pub mod kdj;
pub mod series;

pub use daily::{DailyIndicatorRow, IndicatorRow, compute_daily_indicators, project_tail};
pub use kdj::{KdjCross, WeeklyKdjRow, WeeklyKdjSnapshot, compute_weekly_kdj};
