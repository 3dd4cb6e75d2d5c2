use anyhow::{anyhow, Result};
use concat_string::concat_string;
use reqwest::header::HeaderMap;
use rust_decimal::Decimal;
use scraper::Html;

use crate::{
    crawler::goodinfo::HOST,
    logging,
    util::{
        http::{self, element},
        text,
    },
};

/// 個股資訊頁中 5 年 Beta 所在的欄位
const BETA_SELECTOR: &str = "#secKLine > section:nth-of-type(1) > table > tbody > tr:nth-of-type(2) > td:nth-of-type(8) > a";

/// 抓取個股的 5 年 Beta
///
/// 頁面上找不到或無法解析時回傳 `Ok(None)`。
pub async fn visit(stock_symbol: &str) -> Result<Option<Decimal>> {
    let url = concat_string!("https://", HOST, "/tw/StockDetail.asp?STOCK_ID=", stock_symbol);

    logging::info_file_async(format!("visit url:{}", url));

    let mut headers = HeaderMap::new();
    headers.insert("Host", HOST.parse()?);
    headers.insert("Referer", url.parse()?);
    headers.insert("User-Agent", http::USER_AGENT.parse()?);

    let text = http::get(&url, Some(headers)).await?;
    if text.contains("您的瀏覽量異常") {
        return Err(anyhow!("{} 瀏覽量異常", url));
    }

    Ok(parse(&text))
}

pub fn parse(html: &str) -> Option<Decimal> {
    let document = Html::parse_document(html);
    let value = element::parse_value(&document.root_element(), BETA_SELECTOR)?;

    match text::parse_decimal(value.trim(), None) {
        Ok(beta) => Some(beta),
        Err(why) => {
            logging::warn_file_async(format!("Failed to parse beta because {:?}", why));
            None
        }
    }
}
