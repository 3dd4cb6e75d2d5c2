/// 台灣股市資訊網
pub mod goodinfo;
/// 台灣證券交易所
pub mod twse;
