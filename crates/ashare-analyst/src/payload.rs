//! The analysis payload handed to the report writer

use crate::indicators::IndicatorRow;
use crate::models::{CompanyProfile, DailyBasic, DailyQuote, IncomeStatement, MoneyFlow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Section names in prompt order
pub const SECTION_NAMES: [&str; 7] = [
    "basic",
    "quotes",
    "fundamentals",
    "moneyflows",
    "income",
    "technical_indicators",
    "professional_indicators_analysis",
];

/// Everything known about one ticker for a single request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub basic: Vec<CompanyProfile>,
    pub quotes: Vec<DailyQuote>,
    pub fundamentals: Vec<DailyBasic>,
    pub moneyflows: Vec<MoneyFlow>,
    pub income: Vec<IncomeStatement>,
    pub technical_indicators: Vec<IndicatorRow>,
    pub professional_indicators_analysis: String,
}

impl AnalysisPayload {
    /// Section name to serialized content, in [`SECTION_NAMES`] order.
    ///
    /// Dataset sections are JSON arrays of records; the factor commentary is
    /// kept as plain text.
    pub fn to_sections(&self) -> serde_json::Result<Map<String, Value>> {
        let contents = [
            serde_json::to_string(&self.basic)?,
            serde_json::to_string(&self.quotes)?,
            serde_json::to_string(&self.fundamentals)?,
            serde_json::to_string(&self.moneyflows)?,
            serde_json::to_string(&self.income)?,
            serde_json::to_string(&self.technical_indicators)?,
            self.professional_indicators_analysis.clone(),
        ];
        Ok(SECTION_NAMES
            .iter()
            .zip(contents)
            .map(|(name, content)| ((*name).to_string(), Value::String(content)))
            .collect())
    }

    /// Indented JSON of the section map, as embedded in the analysis prompt
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_sections()?)
    }
}
