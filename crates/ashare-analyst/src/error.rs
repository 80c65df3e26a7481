//! Error types for data retrieval and analysis

use thiserror::Error;

/// Errors raised below the pipeline boundary
#[derive(Debug, Error)]
pub enum StockError {
    /// API request failed
    #[error("API error: {0}")]
    ApiError(String),

    /// Tushare answered with a non-zero status code
    #[error("Tushare error {code} on {api_name}: {msg}")]
    ProviderError {
        api_name: String,
        code: i64,
        msg: String,
    },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Technical indicator calculation error
    #[error("Technical indicator error: {0}")]
    IndicatorError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for stock operations
pub type Result<T> = std::result::Result<T, StockError>;

/// Terminal, user-visible failures of [`crate::StockDataLoader::load`]
#[derive(Debug, Error)]
pub enum LoadError {
    /// No provider session was constructed
    #[error("Tushare Pro接口未初始化，无法获取数据。")]
    NotInitialized,

    /// Daily quotes came back empty after retries
    #[error("无法获取 {ts_code} 的核心行情数据，分析中止。")]
    QuotesUnavailable { ts_code: String },

    /// Company profile came back empty after retries
    #[error("无法获取 {ts_code} 的公司基本信息，分析中止。")]
    ProfileUnavailable { ts_code: String },

    /// Indicator computation could not be set up
    #[error("指标计算失败: {0}")]
    Indicator(#[from] StockError),
}
