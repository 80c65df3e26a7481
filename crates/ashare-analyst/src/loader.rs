//! Assembles raw datasets and derived indicators into one payload

use crate::api::{MarketDataProvider, TushareClient};
use crate::config::{AnalystConfig, LookbackConfig};
use crate::error::{LoadError, Result};
use crate::fetcher::RetryPolicy;
use crate::indicators::{
    WeeklyKdjSnapshot, compute_daily_indicators, compute_weekly_kdj, project_tail,
};
use crate::models::{DateRange, sort_by_date};
use crate::narrator::describe_factors;
use crate::payload::AnalysisPayload;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::{info, warn};

/// Loads everything the report needs for one ticker.
///
/// Holds the provider session explicitly; a loader built without one fails
/// every request with [`LoadError::NotInitialized`] and never touches the
/// network.
#[derive(Clone)]
pub struct StockDataLoader {
    provider: Option<Arc<dyn MarketDataProvider>>,
    retry: RetryPolicy,
    lookback: LookbackConfig,
}

impl StockDataLoader {
    /// Loader over an existing provider session
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: &AnalystConfig) -> Self {
        Self {
            provider: Some(provider),
            retry: RetryPolicy::from_config(config),
            lookback: config.lookback,
        }
    }

    /// Loader without a provider session
    pub fn unconfigured(config: &AnalystConfig) -> Self {
        Self {
            provider: None,
            retry: RetryPolicy::from_config(config),
            lookback: config.lookback,
        }
    }

    /// Build the Tushare session from `config`.
    ///
    /// A missing or placeholder token yields an unconfigured loader rather
    /// than an error, so the failure surfaces per request.
    pub fn from_config(config: &AnalystConfig) -> Result<Self> {
        config.validate()?;

        match config.usable_token() {
            Some(token) => {
                let client = TushareClient::new(token, config)?;
                info!("Tushare Pro client initialized");
                Ok(Self::new(Arc::new(client), config))
            }
            None => {
                warn!("TUSHARE_TOKEN not configured; data loading is disabled");
                Ok(Self::unconfigured(config))
            }
        }
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Whether a provider session is present
    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Load the payload for `ts_code` using today's date
    pub async fn load(&self, ts_code: &str) -> std::result::Result<AnalysisPayload, LoadError> {
        self.load_as_of(ts_code, Local::now().date_naive()).await
    }

    /// Load the payload with lookback windows ending at `today`
    pub async fn load_as_of(
        &self,
        ts_code: &str,
        today: NaiveDate,
    ) -> std::result::Result<AnalysisPayload, LoadError> {
        let Some(provider) = self.provider.as_deref() else {
            return Err(LoadError::NotInitialized);
        };

        info!(ts_code, %today, "loading stock data");

        let daily = DateRange::trailing(today, self.lookback.daily_days);
        let weekly_range = DateRange::trailing(today, self.lookback.weekly_days);
        let factor_range = DateRange::trailing(today, self.lookback.factor_days);
        let retry = &self.retry;

        // Sequential on purpose: all calls share one provider quota
        let basic = retry
            .fetch_or_empty("stock_company", || provider.company_profile(ts_code))
            .await;
        let mut quotes = retry
            .fetch_or_empty("daily", || provider.daily_quotes(ts_code, daily))
            .await;
        let mut fundamentals = retry
            .fetch_or_empty("daily_basic", || provider.daily_basics(ts_code, daily))
            .await;
        let mut moneyflows = retry
            .fetch_or_empty("moneyflow", || provider.money_flows(ts_code, daily))
            .await;
        let mut income = retry
            .fetch_or_empty("income", || provider.income_statements(ts_code))
            .await;
        let mut weekly = retry
            .fetch_or_empty("stk_week_month_adj", || {
                provider.weekly_bars(ts_code, weekly_range)
            })
            .await;
        let mut factors = retry
            .fetch_or_empty("stk_factor_pro", || provider.factors(ts_code, factor_range))
            .await;

        if quotes.is_empty() {
            return Err(LoadError::QuotesUnavailable {
                ts_code: ts_code.to_string(),
            });
        }
        if basic.is_empty() {
            return Err(LoadError::ProfileUnavailable {
                ts_code: ts_code.to_string(),
            });
        }

        sort_by_date(&mut quotes);
        sort_by_date(&mut fundamentals);
        sort_by_date(&mut moneyflows);
        sort_by_date(&mut income);
        sort_by_date(&mut weekly);
        sort_by_date(&mut factors);

        let keep_from = income.len().saturating_sub(self.lookback.income_periods);
        income.drain(..keep_from);

        let weekly_kdj = compute_weekly_kdj(&weekly)?;
        let snapshot = WeeklyKdjSnapshot::latest(&weekly_kdj);
        let frame = compute_daily_indicators(&quotes, &moneyflows, snapshot.as_ref())?;
        let technical_indicators = project_tail(&frame, self.lookback.indicator_rows);
        let professional_indicators_analysis = describe_factors(&factors);

        info!(
            ts_code,
            quotes = quotes.len(),
            weekly = weekly.len(),
            factors = factors.len(),
            "stock data loaded"
        );

        Ok(AnalysisPayload {
            basic,
            quotes,
            fundamentals,
            moneyflows,
            income,
            technical_indicators,
            professional_indicators_analysis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockMarketDataProvider;
    use crate::error::StockError;
    use crate::models::{CompanyProfile, DailyQuote, IncomeStatement};

    fn quote(date: &str, close: f64) -> DailyQuote {
        DailyQuote {
            ts_code: "600519.SH".to_string(),
            trade_date: date.to_string(),
            open: close,
            high: close,
            low: close,
            close,
            pre_close: None,
            change: None,
            pct_chg: None,
            vol: 1000.0,
            amount: None,
        }
    }

    fn profile() -> CompanyProfile {
        CompanyProfile {
            ts_code: "600519.SH".to_string(),
            exchange: Some("SSE".to_string()),
            ..Default::default()
        }
    }

    fn fast_loader(mock: MockMarketDataProvider) -> StockDataLoader {
        StockDataLoader::new(Arc::new(mock), &AnalystConfig::default())
            .with_retry_policy(RetryPolicy::fast())
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    }

    /// Optional datasets answer with nothing
    fn expect_optional_empty(mock: &mut MockMarketDataProvider) {
        mock.expect_daily_basics().returning(|_, _| Ok(Vec::new()));
        mock.expect_money_flows().returning(|_, _| Ok(Vec::new()));
        mock.expect_income_statements().returning(|_| Ok(Vec::new()));
        mock.expect_weekly_bars().returning(|_, _| Ok(Vec::new()));
        mock.expect_factors().returning(|_, _| Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_unconfigured_loader() {
        let loader = StockDataLoader::unconfigured(&AnalystConfig::default());
        assert!(!loader.is_configured());

        let err = loader.load("600519.SH").await.unwrap_err();
        assert!(matches!(err, LoadError::NotInitialized));
        assert!(err.to_string().contains("未初始化"));
    }

    #[test]
    fn test_from_config_without_token() {
        let loader = StockDataLoader::from_config(&AnalystConfig::default()).unwrap();
        assert!(!loader.is_configured());
    }

    #[tokio::test]
    async fn test_lookback_windows() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_company_profile().returning(|_| Ok(vec![profile()]));
        mock.expect_daily_quotes()
            .withf(|code, range| {
                code == "600519.SH"
                    && range.start_param() == "20240101"
                    && range.end_param() == "20240331"
            })
            .times(1)
            .returning(|_, _| Ok(vec![quote("20240329", 1700.0)]));
        mock.expect_daily_basics().returning(|_, _| Ok(Vec::new()));
        mock.expect_money_flows().returning(|_, _| Ok(Vec::new()));
        mock.expect_income_statements().returning(|_| Ok(Vec::new()));
        mock.expect_weekly_bars()
            .withf(|_, range| range.start_param() == "20190402")
            .returning(|_, _| Ok(Vec::new()));
        mock.expect_factors()
            .withf(|_, range| range.start_param() == "20240301")
            .returning(|_, _| Ok(Vec::new()));

        let payload = fast_loader(mock).load_as_of("600519.SH", today()).await.unwrap();
        assert_eq!(payload.quotes.len(), 1);
        assert_eq!(payload.technical_indicators.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_quotes_fail() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_company_profile().returning(|_| Ok(vec![profile()]));
        mock.expect_daily_quotes().returning(|_, _| Ok(Vec::new()));
        expect_optional_empty(&mut mock);

        let err = fast_loader(mock).load_as_of("600519.SH", today()).await.unwrap_err();
        assert!(matches!(err, LoadError::QuotesUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_quotes_checked_before_profile() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_company_profile().returning(|_| Ok(Vec::new()));
        mock.expect_daily_quotes().returning(|_, _| Ok(Vec::new()));
        expect_optional_empty(&mut mock);

        let err = fast_loader(mock).load_as_of("600519.SH", today()).await.unwrap_err();
        assert!(matches!(err, LoadError::QuotesUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_empty_profile_fails() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_company_profile().returning(|_| Ok(Vec::new()));
        mock.expect_daily_quotes()
            .returning(|_, _| Ok(vec![quote("20240329", 1700.0)]));
        expect_optional_empty(&mut mock);

        let err = fast_loader(mock).load_as_of("600519.SH", today()).await.unwrap_err();
        assert!(matches!(err, LoadError::ProfileUnavailable { .. }));
        assert!(err.to_string().contains("600519.SH"));
    }

    #[tokio::test]
    async fn test_failing_profile_is_retried_then_reported() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_company_profile()
            .times(3)
            .returning(|_| Err(StockError::ApiError("timeout".to_string())));
        mock.expect_daily_quotes()
            .returning(|_, _| Ok(vec![quote("20240329", 1700.0)]));
        expect_optional_empty(&mut mock);

        let err = fast_loader(mock).load_as_of("600519.SH", today()).await.unwrap_err();
        assert!(matches!(err, LoadError::ProfileUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_no_retry_policy_calls_once() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_company_profile().returning(|_| Ok(vec![profile()]));
        mock.expect_daily_quotes()
            .times(1)
            .returning(|_, _| Err(StockError::ApiError("timeout".to_string())));
        expect_optional_empty(&mut mock);

        let loader = StockDataLoader::new(Arc::new(mock), &AnalystConfig::default())
            .with_retry_policy(RetryPolicy::no_retry());
        let err = loader.load_as_of("600519.SH", today()).await.unwrap_err();
        assert!(matches!(err, LoadError::QuotesUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_optional_failures_degrade() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_company_profile().returning(|_| Ok(vec![profile()]));
        mock.expect_daily_quotes().returning(|_, _| {
            Ok(vec![quote("20240329", 1710.0), quote("20240328", 1700.0)])
        });
        mock.expect_daily_basics()
            .returning(|_, _| Err(StockError::ApiError("boom".to_string())));
        mock.expect_money_flows()
            .returning(|_, _| Err(StockError::ApiError("boom".to_string())));
        mock.expect_income_statements()
            .returning(|_| Err(StockError::ApiError("boom".to_string())));
        mock.expect_weekly_bars()
            .returning(|_, _| Err(StockError::ApiError("boom".to_string())));
        mock.expect_factors()
            .returning(|_, _| Err(StockError::ApiError("boom".to_string())));

        let payload = fast_loader(mock).load_as_of("600519.SH", today()).await.unwrap();
        assert!(payload.fundamentals.is_empty());
        assert!(payload.income.is_empty());
        assert_eq!(payload.quotes[0].trade_date, "20240328");
        assert_eq!(
            payload.professional_indicators_analysis,
            crate::narrator::FACTORS_MISSING
        );
        assert!(payload
            .technical_indicators
            .iter()
            .all(|row| row.weekly_k_latest.is_none()));
    }

    #[tokio::test]
    async fn test_income_keeps_latest_periods() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_company_profile().returning(|_| Ok(vec![profile()]));
        mock.expect_daily_quotes()
            .returning(|_, _| Ok(vec![quote("20240329", 1700.0)]));
        mock.expect_daily_basics().returning(|_, _| Ok(Vec::new()));
        mock.expect_money_flows().returning(|_, _| Ok(Vec::new()));
        mock.expect_income_statements().returning(|_| {
            Ok((0..12)
                .rev()
                .map(|year| IncomeStatement {
                    ts_code: "600519.SH".to_string(),
                    ann_date: Some(format!("{}0330", 2012 + year)),
                    ..Default::default()
                })
                .collect())
        });
        mock.expect_weekly_bars().returning(|_, _| Ok(Vec::new()));
        mock.expect_factors().returning(|_, _| Ok(Vec::new()));

        let payload = fast_loader(mock).load_as_of("600519.SH", today()).await.unwrap();
        let dates: Vec<&str> = payload
            .income
            .iter()
            .filter_map(|row| row.ann_date.as_deref())
            .collect();
        assert_eq!(dates.len(), 8);
        assert_eq!(dates.first(), Some(&"20160330"));
        assert_eq!(dates.last(), Some(&"20230330"));
    }
}
