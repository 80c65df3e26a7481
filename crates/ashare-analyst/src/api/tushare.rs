//! Tushare Pro API client
//!
//! Every Tushare endpoint is a single POST of
//! `{"api_name", "token", "params", "fields"}` and answers with a column list
//! plus positional row arrays:
//!
//! ```json
//! {"code": 0, "msg": "", "data": {"fields": ["ts_code", "trade_date"], "items": [["600519.SH", "20240102"]]}}
//! ```
//!
//! Rate limit: quota per minute from [`AnalystConfig::rate_limit_per_minute`].

use super::MarketDataProvider;
use crate::config::AnalystConfig;
use crate::error::{Result, StockError};
use crate::models::{
    CompanyProfile, DailyBasic, DailyQuote, Dataset, DateRange, FactorRow, IncomeStatement,
    MoneyFlow, WeeklyBar,
};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::debug;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Request body shared by all endpoints
#[derive(Debug, Serialize)]
struct TushareRequest<'a> {
    api_name: &'a str,
    token: &'a str,
    params: BTreeMap<&'a str, String>,
    fields: &'a str,
}

/// Response envelope
#[derive(Debug, Deserialize)]
struct TushareResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<TushareTable>,
}

#[derive(Debug, Deserialize)]
struct TushareTable {
    fields: Vec<String>,
    #[serde(default)]
    items: Vec<Vec<Value>>,
}

/// Tushare Pro client holding the session token
#[derive(Clone)]
pub struct TushareClient {
    client: Client,
    api_url: String,
    token: String,
    rate_limiter: SharedRateLimiter,
}

impl TushareClient {
    /// Create a client from a token and the transport settings in `config`
    pub fn new(token: impl Into<String>, config: &AnalystConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        let per_minute = NonZeroU32::new(config.rate_limit_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            token: token.into(),
            rate_limiter,
        })
    }

    /// Create a client from the configured token
    pub fn from_config(config: &AnalystConfig) -> Result<Self> {
        let token = config.usable_token().ok_or_else(|| {
            StockError::ConfigError("TUSHARE_TOKEN is not configured".to_string())
        })?;
        Self::new(token, config)
    }

    /// Query one endpoint and decode its rows
    pub async fn query<T: Dataset>(&self, params: &[(&str, String)]) -> Result<Vec<T>> {
        self.rate_limiter.until_ready().await;

        let request = TushareRequest {
            api_name: T::API_NAME,
            token: &self.token,
            params: params.iter().cloned().collect(),
            fields: T::FIELDS,
        };

        debug!(api_name = T::API_NAME, ?params, "Tushare request");

        let response = self.client.post(&self.api_url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(StockError::ApiError(format!(
                "HTTP error {} from {}",
                response.status(),
                T::API_NAME
            )));
        }

        let body: TushareResponse = response.json().await?;
        decode_rows(T::API_NAME, body)
    }

    async fn query_range<T: Dataset>(
        &self,
        ts_code: &str,
        range: DateRange,
        extra: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut params = vec![
            ("ts_code", ts_code.to_string()),
            ("start_date", range.start_param()),
            ("end_date", range.end_param()),
        ];
        params.extend(extra.iter().map(|(key, value)| (*key, (*value).to_string())));
        self.query(&params).await
    }
}

impl fmt::Debug for TushareClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TushareClient")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Turn the positional table into typed rows
fn decode_rows<T: Dataset>(api_name: &str, response: TushareResponse) -> Result<Vec<T>> {
    if response.code != 0 {
        return Err(StockError::ProviderError {
            api_name: api_name.to_string(),
            code: response.code,
            msg: response.msg.unwrap_or_default(),
        });
    }

    let Some(table) = response.data else {
        return Ok(Vec::new());
    };

    table
        .items
        .into_iter()
        .map(|item| {
            let row: Map<String, Value> = table.fields.iter().cloned().zip(item).collect();
            serde_json::from_value(Value::Object(row)).map_err(StockError::from)
        })
        .collect()
}

#[async_trait]
impl MarketDataProvider for TushareClient {
    async fn company_profile(&self, ts_code: &str) -> Result<Vec<CompanyProfile>> {
        self.query(&[("ts_code", ts_code.to_string())]).await
    }

    async fn daily_quotes(&self, ts_code: &str, range: DateRange) -> Result<Vec<DailyQuote>> {
        self.query_range(ts_code, range, &[]).await
    }

    async fn daily_basics(&self, ts_code: &str, range: DateRange) -> Result<Vec<DailyBasic>> {
        self.query_range(ts_code, range, &[]).await
    }

    async fn money_flows(&self, ts_code: &str, range: DateRange) -> Result<Vec<MoneyFlow>> {
        self.query_range(ts_code, range, &[]).await
    }

    async fn income_statements(&self, ts_code: &str) -> Result<Vec<IncomeStatement>> {
        self.query(&[("ts_code", ts_code.to_string())]).await
    }

    async fn weekly_bars(&self, ts_code: &str, range: DateRange) -> Result<Vec<WeeklyBar>> {
        self.query_range(ts_code, range, &[("freq", "week")]).await
    }

    async fn factors(&self, ts_code: &str, range: DateRange) -> Result<Vec<FactorRow>> {
        self.query_range(ts_code, range, &[]).await
    }
}
