//! A-share data retrieval and indicator pipeline
//!
//! Pulls company, market, fundamental and factor data for one listed company
//! from Tushare Pro, computes a weekly KDJ oscillator and a daily indicator
//! frame, narrates the provider's professional factors, and bundles the lot
//! into an [`AnalysisPayload`] ready to be embedded in a language-model prompt.
//!
//! # Example
//!
//! ```rust,ignore
//! use ashare_analyst::{AnalystConfig, StockDataLoader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AnalystConfig::builder().with_env().build()?;
//!     let loader = StockDataLoader::from_config(&config)?;
//!
//!     let payload = loader.load("600519.SH").await?;
//!     println!("{}", payload.to_pretty_json()?);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod indicators;
pub mod loader;
pub mod models;
pub mod narrator;
pub mod payload;

// Re-export main types for convenience
pub use api::{MarketDataProvider, TushareClient};
pub use config::{AnalystConfig, AnalystConfigBuilder, LookbackConfig};
pub use error::{LoadError, Result, StockError};
pub use fetcher::RetryPolicy;
pub use indicators::{
    DailyIndicatorRow, IndicatorRow, KdjCross, WeeklyKdjRow, WeeklyKdjSnapshot,
    compute_daily_indicators, compute_weekly_kdj,
};
pub use loader::StockDataLoader;
pub use models::{
    CompanyProfile, DailyBasic, DailyQuote, DateRange, FactorRow, IncomeStatement, MoneyFlow,
    WeeklyBar,
};
pub use narrator::describe_factors;
pub use payload::AnalysisPayload;
