use anyhow::{anyhow, Result};
use async_trait::async_trait;
use concat_string::concat_string;
use reqwest::StatusCode;
use scraper::Html;

use crate::{
    crawler::twse,
    declare::{Period, Quarter, StatementKind},
    history::StatementSource,
    logging,
    statement::{FinancialRow, Statement},
    util::http::{self, element, TextForceBig5},
};

/// 報表頁中各財報所在的表格，依出現順序以 `StatementKind::table_index` 取用
const TABLE_SELECTOR: &str =
    r#"div[class="container"] > div[class="content"] > table:first-of-type"#;

/// IFRS 合併財報頁面的網址
pub fn url(year: i32, stock_code: &str, quarter: Quarter) -> String {
    let year = year.to_string();
    let season = quarter.serial().to_string();

    concat_string!(
        "https://",
        twse::HOST,
        "/server-java/t164sb01?step=3&SYEAR=",
        year,
        "&file_name=tifrs-fr1-m1-ci-cr-",
        stock_code,
        "-",
        year,
        "Q",
        season,
        ".html"
    )
}

/// 抓取指定年度、季度的財報並取出其中一張表
///
/// 回應狀態碼不是 200 時(網站請求失敗或該資料尚不存在)回傳 `Ok(None)`。
pub async fn visit(
    year: i32,
    stock_code: &str,
    quarter: Quarter,
    kind: StatementKind,
) -> Result<Option<Statement>> {
    let url = url(year, stock_code, quarter);
    let response = http::get_response(&url, None).await?;
    let status = response.status();

    if status != StatusCode::OK {
        logging::error_console(format!(
            "網站資料請求失敗或該資料尚不存在，狀態碼：{} {}",
            status, url
        ));
        return Ok(None);
    }

    let text = response.text_force_big5().await?;

    parse(&text, kind).map(Some)
}

/// 解析報表頁，取出 `kind` 對應的表格
pub fn parse(html: &str, kind: StatementKind) -> Result<Statement> {
    let document = Html::parse_document(html);
    let table_selector = element::selector(TABLE_SELECTOR)?;
    let tr_selector = element::selector("tr")?;
    let table = document
        .select(&table_selector)
        .nth(kind.table_index())
        .ok_or_else(|| anyhow!("{}({}) not found in the report", kind.name(), kind.table_index()))?;

    let mut statement = Statement::new();

    for tr in table.select(&tr_selector) {
        let cells = element::cells(&tr);
        if cells.len() <= 2 {
            continue;
        }

        // 第一欄若沒代號則跳過
        if cells[0].is_empty() {
            continue;
        }

        statement.push(FinancialRow::from_cells(&cells[0], &cells[1], &cells[2]));
    }

    Ok(statement)
}

/// 公開資訊觀測站的 IFRS 財報
#[derive(Debug, Clone)]
pub struct Mops {
    stock_code: String,
}

impl Mops {
    pub fn new(stock_code: impl Into<String>) -> Self {
        Mops {
            stock_code: stock_code.into(),
        }
    }
}

#[async_trait]
impl StatementSource for Mops {
    async fn fetch(&self, period: Period, kind: StatementKind) -> Result<Option<Statement>> {
        visit(period.year, &self.stock_code, period.quarter, kind).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"
<html><body>
<div class="container">
  <div class="content"><table><tr><td>2330 台灣積體電路製造股份有限公司</td></tr></table></div>
  <div class="content">
    <table>
      <tr><th>代號</th><th>會計項目</th><th>本期</th></tr>
      <tr><td>1100</td><td>　現金及約當現金 Total cash and cash equivalents</td><td>1,465,427,753</td><td>1,064,990,192</td></tr>
      <tr><td></td><td>流動資產</td><td></td><td></td></tr>
      <tr><td>2100</td><td>　短期借款 Short-term borrowings</td><td>(1,234)</td><td>0</td></tr>
      <tr><td>3XXX</td><td>權益總額 Total equity</td><td>--</td><td>--</td></tr>
      <tr><td>9999</td><td>only two</td></tr>
    </table>
    <table><tr><td>9000</td><td>second table</td><td>1</td></tr></table>
  </div>
  <div class="content">
    <table>
      <tr><td>4000</td><td>營業收入合計 Total operating revenue</td><td>625,529,456</td></tr>
      <tr><td>5900</td><td>營業毛利（毛損）淨額</td><td>331,340,497</td></tr>
    </table>
  </div>
  <div class="content">
    <table>
      <tr><td>A10000</td><td>本期稅前淨利（淨損）</td><td>261,227,643</td></tr>
    </table>
  </div>
</div>
</body></html>
"#;

    #[test]
    fn test_url() {
        assert_eq!(
            url(2023, "2330", Quarter::Q4),
            "https://mopsov.twse.com.tw/server-java/t164sb01?step=3&SYEAR=2023&file_name=tifrs-fr1-m1-ci-cr-2330-2023Q4.html"
        );
    }

    #[test]
    fn test_parse_balance_sheet() {
        let statement = parse(REPORT, StatementKind::BalanceSheet).unwrap();

        assert_eq!(statement.len(), 3);
        assert_eq!(statement.value("1100"), Some(Some(1_465_427_753)));
        assert_eq!(statement.value("現金及約當現金"), Some(Some(1_465_427_753)));
        assert_eq!(statement.value("2100"), Some(Some(-1234)));
        assert_eq!(statement.value("權益總額"), Some(None));
        assert_eq!(statement.value("流動資產"), None);
        assert_eq!(statement.value("9999"), None);
        assert_eq!(statement.value("9000"), None);
    }

    #[test]
    fn test_parse_income_and_cash_flows() {
        let income = parse(REPORT, StatementKind::ComprehensiveIncome).unwrap();
        assert_eq!(income.value("4000"), Some(Some(625_529_456)));
        assert_eq!(income.value("營業毛利"), Some(Some(331_340_497)));

        let cash_flows = parse(REPORT, StatementKind::CashFlows).unwrap();
        assert_eq!(cash_flows.value("A10000"), Some(Some(261_227_643)));
    }

    #[test]
    fn test_parse_missing_table() {
        let html = r#"<div class="container"><div class="content"><table></table></div></div>"#;
        assert!(parse(html, StatementKind::BalanceSheet).is_err());
    }

    #[tokio::test]
    #[ignore]
    async fn test_visit() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 visit".to_string());

        match visit(2023, "2330", Quarter::Q4, StatementKind::BalanceSheet).await {
            Ok(Some(statement)) => {
                logging::debug_file_async(format!("rows:{:#?}", statement.rows()));
            }
            Ok(None) => {
                logging::debug_file_async("report not found".to_string());
            }
            Err(why) => {
                logging::debug_file_async(format!("Failed to visit because {:?}", why));
            }
        }

        logging::debug_file_async("結束 visit".to_string());
    }
}
