/// 個股 Beta
pub mod beta;

/// 台灣股市資訊網
pub const HOST: &str = "goodinfo.tw";
