//! Market data provider abstraction and the Tushare Pro client

pub mod tushare;

pub use tushare::TushareClient;

use crate::error::Result;
use crate::models::{
    CompanyProfile, DailyBasic, DailyQuote, DateRange, FactorRow, IncomeStatement, MoneyFlow,
    WeeklyBar,
};
use async_trait::async_trait;

/// The seven datasets the pipeline pulls for one ticker.
///
/// Implementations return rows in whatever order the backend delivers;
/// callers sort.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Listed company profile
    async fn company_profile(&self, ts_code: &str) -> Result<Vec<CompanyProfile>>;

    /// Daily quotes in `range`
    async fn daily_quotes(&self, ts_code: &str, range: DateRange) -> Result<Vec<DailyQuote>>;

    /// Daily valuation metrics in `range`
    async fn daily_basics(&self, ts_code: &str, range: DateRange) -> Result<Vec<DailyBasic>>;

    /// Money flow in `range`
    async fn money_flows(&self, ts_code: &str, range: DateRange) -> Result<Vec<MoneyFlow>>;

    /// Every income statement on record
    async fn income_statements(&self, ts_code: &str) -> Result<Vec<IncomeStatement>>;

    /// Forward-adjusted weekly bars in `range`
    async fn weekly_bars(&self, ts_code: &str, range: DateRange) -> Result<Vec<WeeklyBar>>;

    /// Professional factor rows in `range`
    async fn factors(&self, ts_code: &str, range: DateRange) -> Result<Vec<FactorRow>>;
}
