//! Plain-language readout of the provider's professional factors
//!
//! Only the latest factor row is read. Each indicator family contributes one
//! sentence when its inputs are present, always in the order BBI, CCI, DMI,
//! KDJ, MACD, RSI.

use crate::models::FactorRow;

/// Text used when the factor dataset is empty
pub const FACTORS_MISSING: &str = "专业指标数据缺失，无法进行分析。";

/// Text used when the latest row has no usable family
pub const NO_USABLE_FACTORS: &str = "无可用专业指标进行分析。";

const CCI_OVERBOUGHT: f64 = 100.0;
const CCI_OVERSOLD: f64 = -100.0;
const RSI_OVERBOUGHT: f64 = 80.0;
const RSI_OVERSOLD: f64 = 20.0;

fn zone(value: f64, overbought: f64, oversold: f64) -> &'static str {
    if value > overbought {
        "超买"
    } else if value < oversold {
        "超卖"
    } else {
        "常态"
    }
}

fn bbi_sentence(row: &FactorRow) -> Option<String> {
    let (bbi, close) = (row.bbi_qfq?, row.close_qfq?);
    let (position, market) = if close > bbi {
        ("高于", "多头")
    } else {
        ("低于", "空头")
    };
    Some(format!(
        "BBI多空指标: {bbi:.2}。当前股价 ({close:.2}) {position}BBI，表明市场目前处于{market}行情。"
    ))
}

fn cci_sentence(row: &FactorRow) -> Option<String> {
    let cci = row.cci_qfq?;
    let status = zone(cci, CCI_OVERBOUGHT, CCI_OVERSOLD);
    Some(format!("CCI顺势指标: {cci:.2}，目前处于{status}区域。"))
}

fn dmi_sentence(row: &FactorRow) -> Option<String> {
    let (pdi, mdi, adx) = (row.dmi_pdi_qfq?, row.dmi_mdi_qfq?, row.dmi_adx_qfq?);
    let trend = if pdi > mdi { "上升" } else { "下降" };
    Some(format!(
        "DMI动向指标: PDI={pdi:.2}, MDI={mdi:.2}, ADX={adx:.2}。目前为{trend}趋势，趋势强度为 {adx:.2}。"
    ))
}

fn kdj_sentence(row: &FactorRow) -> Option<String> {
    let (k, d, j) = (row.kdj_k_qfq?, row.kdj_d_qfq?, row.kdj_qfq?);
    Some(format!("KDJ随机指标: K={k:.2}, D={d:.2}, J={j:.2}。"))
}

fn macd_sentence(row: &FactorRow) -> Option<String> {
    let (dif, dea, macd) = (row.macd_dif_qfq?, row.macd_dea_qfq?, row.macd_qfq?);
    let cross = if dif > dea { "金叉" } else { "死叉" };
    Some(format!(
        "MACD指标: DIF={dif:.2}, DEA={dea:.2}, MACD柱={macd:.2}。当前处于{cross}状态。"
    ))
}

fn rsi_sentence(row: &FactorRow) -> Option<String> {
    let rsi = row.rsi_qfq_12?;
    let status = zone(rsi, RSI_OVERBOUGHT, RSI_OVERSOLD);
    Some(format!("RSI相对强弱指标(12日): {rsi:.2}，目前处于{status}区域。"))
}

/// Describe the latest factor row.
///
/// `factors` must be sorted ascending by trade date.
pub fn describe_factors(factors: &[FactorRow]) -> String {
    let Some(latest) = factors.last() else {
        return FACTORS_MISSING.to_string();
    };

    let families: [fn(&FactorRow) -> Option<String>; 6] = [
        bbi_sentence,
        cci_sentence,
        dmi_sentence,
        kdj_sentence,
        macd_sentence,
        rsi_sentence,
    ];
    let sentences: Vec<String> = families
        .iter()
        .filter_map(|sentence| sentence(latest))
        .collect();

    if sentences.is_empty() {
        NO_USABLE_FACTORS.to_string()
    } else {
        sentences.join(" ")
    }
}
