/// IFRS 合併財務報表
pub mod financial_report;

/// 公開資訊觀測站(舊版)
pub const HOST: &str = "mopsov.twse.com.tw";
