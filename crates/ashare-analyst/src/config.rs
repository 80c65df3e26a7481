//! Configuration for data retrieval and analysis

use crate::error::{Result, StockError};
use ashare_utils::{env_flag, env_string};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Tushare Pro HTTP endpoint
pub const DEFAULT_API_URL: &str = "http://api.tushare.pro";

/// Sample `.env` files ship tokens like `your_tushare_token_here`
const TOKEN_PLACEHOLDER_PREFIX: &str = "your_";

/// Lookback windows for each dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookbackConfig {
    /// Calendar days of quotes, fundamentals and money flow
    pub daily_days: i64,
    /// Calendar days of professional factor data
    pub factor_days: i64,
    /// Calendar days of weekly bars
    pub weekly_days: i64,
    /// Most recent income statements kept
    pub income_periods: usize,
    /// Rows of the indicator projection handed downstream
    pub indicator_rows: usize,
}

impl Default for LookbackConfig {
    fn default() -> Self {
        Self {
            daily_days: 90,
            factor_days: 30,
            weekly_days: 5 * 365,
            income_periods: 8,
            indicator_rows: 60,
        }
    }
}

/// Configuration for the analysis pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalystConfig {
    /// Tushare Pro token
    pub tushare_token: Option<String>,

    /// Master switch for the Tushare provider
    pub tushare_enabled: bool,

    /// Tushare Pro endpoint
    pub api_url: String,

    /// Attempts per remote call, first try included
    pub max_attempts: u32,

    /// Fixed wait after a failed attempt
    pub retry_delay: Duration,

    /// Wait before every attempt
    pub pacing_delay: Duration,

    /// Provider-side quota in requests per minute
    pub rate_limit_per_minute: u32,

    /// HTTP request timeout
    pub request_timeout: Duration,

    /// Dataset lookback windows
    pub lookback: LookbackConfig,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        Self {
            tushare_token: None,
            tushare_enabled: true,
            api_url: DEFAULT_API_URL.to_string(),
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
            pacing_delay: Duration::from_millis(100),
            rate_limit_per_minute: 200,
            request_timeout: Duration::from_secs(30),
            lookback: LookbackConfig::default(),
        }
    }
}

impl AnalystConfig {
    /// Create a new configuration builder
    pub fn builder() -> AnalystConfigBuilder {
        AnalystConfigBuilder::default()
    }

    /// Overlay `TUSHARE_TOKEN`, `TUSHARE_ENABLED` and `TUSHARE_API_URL`
    pub fn with_env(mut self) -> Self {
        if let Some(token) = env_string("TUSHARE_TOKEN") {
            self.tushare_token = Some(token);
        }
        self.tushare_enabled = env_flag("TUSHARE_ENABLED", self.tushare_enabled);
        if let Some(url) = env_string("TUSHARE_API_URL") {
            self.api_url = url;
        }
        self
    }

    /// Usable token, if the provider is enabled and the token is real
    pub fn usable_token(&self) -> Option<&str> {
        if !self.tushare_enabled {
            return None;
        }
        self.tushare_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty() && !token.starts_with(TOKEN_PLACEHOLDER_PREFIX))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(StockError::ConfigError(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit_per_minute == 0 {
            return Err(StockError::ConfigError(
                "rate_limit_per_minute must be greater than 0".to_string(),
            ));
        }

        if self.lookback.indicator_rows == 0 {
            return Err(StockError::ConfigError(
                "indicator_rows must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for AnalystConfig
#[derive(Debug, Default)]
pub struct AnalystConfigBuilder {
    tushare_token: Option<String>,
    tushare_enabled: Option<bool>,
    api_url: Option<String>,
    max_attempts: Option<u32>,
    retry_delay: Option<Duration>,
    pacing_delay: Option<Duration>,
    rate_limit_per_minute: Option<u32>,
    request_timeout: Option<Duration>,
    lookback: Option<LookbackConfig>,
    from_env: bool,
}

impl AnalystConfigBuilder {
    /// Set the Tushare token
    pub fn tushare_token(mut self, token: impl Into<String>) -> Self {
        self.tushare_token = Some(token.into());
        self
    }

    /// Enable or disable the Tushare provider
    pub fn tushare_enabled(mut self, enabled: bool) -> Self {
        self.tushare_enabled = Some(enabled);
        self
    }

    /// Set the API endpoint
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Set maximum attempts per call
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Set the wait after a failed attempt
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Set the wait before every attempt
    pub fn pacing_delay(mut self, delay: Duration) -> Self {
        self.pacing_delay = Some(delay);
        self
    }

    /// Set the provider quota
    pub fn rate_limit_per_minute(mut self, limit: u32) -> Self {
        self.rate_limit_per_minute = Some(limit);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set lookback windows
    pub fn lookback(mut self, lookback: LookbackConfig) -> Self {
        self.lookback = Some(lookback);
        self
    }

    /// Apply environment overrides before explicit settings
    pub fn with_env(mut self) -> Self {
        self.from_env = true;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AnalystConfig> {
        let mut defaults = AnalystConfig::default();
        if self.from_env {
            defaults = defaults.with_env();
        }

        let config = AnalystConfig {
            tushare_token: self.tushare_token.or(defaults.tushare_token),
            tushare_enabled: self.tushare_enabled.unwrap_or(defaults.tushare_enabled),
            api_url: self.api_url.unwrap_or(defaults.api_url),
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            retry_delay: self.retry_delay.unwrap_or(defaults.retry_delay),
            pacing_delay: self.pacing_delay.unwrap_or(defaults.pacing_delay),
            rate_limit_per_minute: self
                .rate_limit_per_minute
                .unwrap_or(defaults.rate_limit_per_minute),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            lookback: self.lookback.unwrap_or(defaults.lookback),
        };

        config.validate()?;
        Ok(config)
    }
}
