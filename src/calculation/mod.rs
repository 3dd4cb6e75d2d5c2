/// 股東權益成本、WACC、ROIC 與毛利率
pub mod valuation;
