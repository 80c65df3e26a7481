//! Typed rows for every Tushare dataset the pipeline consumes
//!
//! Numeric columns that the provider may leave empty are `Option<f64>`, so a
//! partially populated row deserializes instead of failing the whole fetch.
//! Daily quote prices and volume stay `f64` and read an empty cell as `NaN`.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Date format used by every Tushare date column
pub const TRADE_DATE_FORMAT: &str = "%Y%m%d";

/// A Tushare dataset: its API name, the requested field list and the column
/// that orders its rows.
pub trait Dataset: DeserializeOwned + Send {
    /// Tushare `api_name`
    const API_NAME: &'static str;
    /// Comma separated `fields` argument
    const FIELDS: &'static str;

    /// `YYYYMMDD` key the series is ordered by
    fn date_key(&self) -> &str;
}

/// Empty price or volume cells decode as `NaN` so the row survives
fn nan_if_null<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

fn nan() -> f64 {
    f64::NAN
}

/// Sort rows ascending by their date column.
///
/// Provider responses come newest first, but every rolling computation needs
/// oldest first. The sort is stable, so same-day rows keep provider order.
pub fn sort_by_date<T: Dataset>(rows: &mut [T]) {
    rows.sort_by(|a, b| a.date_key().cmp(b.date_key()));
}

/// Inclusive calendar range sent as `start_date`/`end_date`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Range ending at `end` and reaching `days` calendar days back
    pub fn trailing(end: NaiveDate, days: i64) -> Self {
        Self {
            start: end - chrono::Duration::days(days),
            end,
        }
    }

    pub fn start_param(&self) -> String {
        self.start.format(TRADE_DATE_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(TRADE_DATE_FORMAT).to_string()
    }
}

/// Listed company profile (`stock_company`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub ts_code: String,
    pub exchange: Option<String>,
    pub chairman: Option<String>,
    pub manager: Option<String>,
    pub secretary: Option<String>,
    pub reg_capital: Option<f64>,
    pub setup_date: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub introduction: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub office: Option<String>,
    pub employees: Option<f64>,
    pub main_business: Option<String>,
    pub business_scope: Option<String>,
}

impl Dataset for CompanyProfile {
    const API_NAME: &'static str = "stock_company";
    const FIELDS: &'static str = "ts_code,exchange,chairman,manager,secretary,reg_capital,setup_date,province,city,introduction,website,email,office,employees,main_business,business_scope";

    fn date_key(&self) -> &str {
        self.setup_date.as_deref().unwrap_or_default()
    }
}

/// Daily quote bar (`daily`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyQuote {
    pub ts_code: String,
    pub trade_date: String,
    #[serde(default = "nan", deserialize_with = "nan_if_null")]
    pub open: f64,
    #[serde(default = "nan", deserialize_with = "nan_if_null")]
    pub high: f64,
    #[serde(default = "nan", deserialize_with = "nan_if_null")]
    pub low: f64,
    #[serde(default = "nan", deserialize_with = "nan_if_null")]
    pub close: f64,
    pub pre_close: Option<f64>,
    pub change: Option<f64>,
    pub pct_chg: Option<f64>,
    /// Volume in lots
    #[serde(default = "nan", deserialize_with = "nan_if_null")]
    pub vol: f64,
    /// Turnover in thousand CNY
    pub amount: Option<f64>,
}

impl Dataset for DailyQuote {
    const API_NAME: &'static str = "daily";
    const FIELDS: &'static str =
        "ts_code,trade_date,open,high,low,close,pre_close,change,pct_chg,vol,amount";

    fn date_key(&self) -> &str {
        &self.trade_date
    }
}

/// Daily valuation metrics (`daily_basic`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyBasic {
    pub ts_code: String,
    pub trade_date: String,
    pub close: Option<f64>,
    pub turnover_rate: Option<f64>,
    pub turnover_rate_f: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub pe: Option<f64>,
    pub pe_ttm: Option<f64>,
    pub pb: Option<f64>,
    pub ps: Option<f64>,
    pub ps_ttm: Option<f64>,
    pub dv_ratio: Option<f64>,
    pub dv_ttm: Option<f64>,
    pub total_share: Option<f64>,
    pub float_share: Option<f64>,
    pub free_share: Option<f64>,
    pub total_mv: Option<f64>,
    pub circ_mv: Option<f64>,
}

impl Dataset for DailyBasic {
    const API_NAME: &'static str = "daily_basic";
    const FIELDS: &'static str = "ts_code,trade_date,close,turnover_rate,turnover_rate_f,volume_ratio,pe,pe_ttm,pb,ps,ps_ttm,dv_ratio,dv_ttm,total_share,float_share,free_share,total_mv,circ_mv";

    fn date_key(&self) -> &str {
        &self.trade_date
    }
}

/// Order-size money flow (`moneyflow`), amounts in ten-thousand CNY
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoneyFlow {
    pub ts_code: String,
    pub trade_date: String,
    pub buy_sm_amount: Option<f64>,
    pub sell_sm_amount: Option<f64>,
    pub buy_md_amount: Option<f64>,
    pub sell_md_amount: Option<f64>,
    pub buy_lg_amount: Option<f64>,
    pub sell_lg_amount: Option<f64>,
    pub buy_elg_amount: Option<f64>,
    pub sell_elg_amount: Option<f64>,
    pub net_mf_vol: Option<f64>,
    pub net_mf_amount: Option<f64>,
}

impl Dataset for MoneyFlow {
    const API_NAME: &'static str = "moneyflow";
    const FIELDS: &'static str = "ts_code,trade_date,buy_sm_amount,sell_sm_amount,buy_md_amount,sell_md_amount,buy_lg_amount,sell_lg_amount,buy_elg_amount,sell_elg_amount,net_mf_vol,net_mf_amount";

    fn date_key(&self) -> &str {
        &self.trade_date
    }
}

/// Income statement headline figures (`income`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub ts_code: String,
    /// Announcement date
    pub ann_date: Option<String>,
    /// Reporting period end
    pub end_date: Option<String>,
    /// Net income attributable to parent shareholders
    pub n_income_attr_p: Option<f64>,
    pub total_revenue: Option<f64>,
}

impl Dataset for IncomeStatement {
    const API_NAME: &'static str = "income";
    const FIELDS: &'static str = "ts_code,ann_date,end_date,n_income_attr_p,total_revenue";

    fn date_key(&self) -> &str {
        self.ann_date.as_deref().unwrap_or_default()
    }
}

/// Weekly bar with forward-adjusted prices (`stk_week_month_adj`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyBar {
    pub ts_code: String,
    pub trade_date: String,
    pub end_date: Option<String>,
    pub freq: Option<String>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub pre_close: Option<f64>,
    pub open_qfq: Option<f64>,
    pub high_qfq: Option<f64>,
    pub low_qfq: Option<f64>,
    pub close_qfq: Option<f64>,
    pub vol: Option<f64>,
    pub amount: Option<f64>,
    pub change: Option<f64>,
    pub pct_chg: Option<f64>,
}

impl Dataset for WeeklyBar {
    const API_NAME: &'static str = "stk_week_month_adj";
    const FIELDS: &'static str = "ts_code,trade_date,end_date,freq,open,high,low,close,pre_close,open_qfq,high_qfq,low_qfq,close_qfq,vol,amount,change,pct_chg";

    fn date_key(&self) -> &str {
        &self.trade_date
    }
}

/// Provider-computed technical factors (`stk_factor_pro`), forward adjusted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorRow {
    pub ts_code: String,
    pub trade_date: String,
    pub close_qfq: Option<f64>,
    pub bbi_qfq: Option<f64>,
    pub cci_qfq: Option<f64>,
    pub dmi_pdi_qfq: Option<f64>,
    pub dmi_mdi_qfq: Option<f64>,
    pub dmi_adx_qfq: Option<f64>,
    pub kdj_k_qfq: Option<f64>,
    pub kdj_d_qfq: Option<f64>,
    pub kdj_qfq: Option<f64>,
    pub macd_dif_qfq: Option<f64>,
    pub macd_dea_qfq: Option<f64>,
    pub macd_qfq: Option<f64>,
    pub rsi_qfq_12: Option<f64>,
}

impl Dataset for FactorRow {
    const API_NAME: &'static str = "stk_factor_pro";
    const FIELDS: &'static str = "ts_code,trade_date,close_qfq,bbi_qfq,cci_qfq,dmi_pdi_qfq,dmi_mdi_qfq,dmi_adx_qfq,kdj_k_qfq,kdj_d_qfq,kdj_qfq,macd_dif_qfq,macd_dea_qfq,macd_qfq,rsi_qfq_12";

    fn date_key(&self) -> &str {
        &self.trade_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(date: &str) -> DailyQuote {
        DailyQuote {
            ts_code: "600519.SH".to_string(),
            trade_date: date.to_string(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            pre_close: None,
            change: None,
            pct_chg: None,
            vol: 100.0,
            amount: None,
        }
    }

    #[test]
    fn test_sort_by_date_ascending() {
        let mut rows = vec![quote("20240105"), quote("20240103"), quote("20240104")];
        sort_by_date(&mut rows);
        let dates: Vec<&str> = rows.iter().map(|r| r.trade_date.as_str()).collect();
        assert_eq!(dates, vec!["20240103", "20240104", "20240105"]);
    }

    #[test]
    fn test_income_without_ann_date_sorts_first() {
        let mut rows = vec![
            IncomeStatement {
                ann_date: Some("20240330".to_string()),
                ..Default::default()
            },
            IncomeStatement::default(),
        ];
        sort_by_date(&mut rows);
        assert!(rows[0].ann_date.is_none());
    }

    #[test]
    fn test_date_range_params() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let range = DateRange::trailing(end, 90);
        assert_eq!(range.end_param(), "20240331");
        assert_eq!(range.start_param(), "20240101");
    }

    #[test]
    fn test_quote_with_empty_cells_keeps_row() {
        let row: DailyQuote = serde_json::from_value(serde_json::json!({
            "ts_code": "600519.SH",
            "trade_date": "20240102",
            "open": 1700.0,
            "high": 1710.0,
            "low": 1690.0,
            "close": null,
            "pct_chg": null
        }))
        .unwrap();
        assert_eq!(row.open, 1700.0);
        assert!(row.close.is_nan());
        assert!(row.vol.is_nan());
        assert!(row.pct_chg.is_none());
    }

    #[test]
    fn test_partial_factor_row_deserializes() {
        let row: FactorRow = serde_json::from_value(serde_json::json!({
            "ts_code": "000001.SZ",
            "trade_date": "20240102",
            "cci_qfq": null,
            "rsi_qfq_12": 55.5,
            "some_unrequested_column": 1.0
        }))
        .unwrap();
        assert_eq!(row.rsi_qfq_12, Some(55.5));
        assert!(row.cci_qfq.is_none());
        assert!(row.bbi_qfq.is_none());
    }
}
