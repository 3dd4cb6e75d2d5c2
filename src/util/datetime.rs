use chrono::{Datelike, Local};

/// 民國紀年與西元紀年的差距
const ROC_YEAR_OFFSET: i32 = 1911;

/// Convert ROC year to Gregorian year.
pub fn roc_to_gregorian_year(year: i32) -> i32 {
    year + ROC_YEAR_OFFSET
}

pub fn current_year() -> i32 {
    Local::now().year()
}
