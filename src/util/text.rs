use std::{collections::HashSet, str::FromStr};

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;

use crate::logging;

const NUMBER_ESCAPE_CHAR: &[char] = &[',', ' ', '"', '\n'];

/// CJK Unified Ideographs 的範圍
const CJK_UNIFIED_IDEOGRAPHS: std::ops::RangeInclusive<char> = '\u{4e00}'..='\u{9fff}';

/// Decodes a Big5-HKSCS encoded byte slice into a UTF-8 `String`.
///
/// `encoding_rs::BIG5` follows the WHATWG definition of Big5, which is Big5-HKSCS.
/// Malformed sequences are replaced with U+FFFD; there is no fallback encoding.
pub fn big5_2_utf8(data: &[u8]) -> String {
    let (text, had_errors) = encoding_rs::BIG5.decode_without_bom_handling(data);
    if had_errors {
        logging::warn_file_async(format!(
            "Big5 decoding replaced malformed sequences ({} bytes)",
            data.len()
        ));
    }

    text.into_owned()
}

/// 取出字串開頭連續的中文字，後面的英文、空白或符號都捨棄
///
/// 開頭不是中文字時回傳去除前後空白的原字串。
///
/// ```
/// assert_eq!(leading_cjk("現金and cash"), "現金");
/// ```
pub fn leading_cjk(text: &str) -> String {
    let run: String = text
        .chars()
        .take_while(|c| CJK_UNIFIED_IDEOGRAPHS.contains(c))
        .collect();

    if run.is_empty() {
        text.trim().to_string()
    } else {
        run
    }
}

/// 依會計慣例解析金額：去掉千分位逗號，括號代表負數
///
/// 無法轉成整數時回傳 `None`。
pub fn parse_accounting_i64(s: &str) -> Option<i64> {
    let cleaned = s.trim().replace(',', "").replace('(', "-").replace(')', "");
    i64::from_str(&cleaned).ok()
}

/// Parses a decimal value from a given string.
///
/// Thousands separators and the other characters in `NUMBER_ESCAPE_CHAR` are removed first,
/// together with any additional `escape_chars`.
pub fn parse_decimal(s: &str, escape_chars: Option<Vec<char>>) -> Result<Decimal> {
    let cleaned = clean_escape_chars(s, escape_chars);
    Decimal::from_str(&cleaned)
        .map_err(|why| anyhow!("Failed to parse '{}' as Decimal because {:?}", cleaned, why))
}

/// Removes the default number escape characters plus `escape_chars` from `s`.
pub(crate) fn clean_escape_chars(s: &str, escape_chars: Option<Vec<char>>) -> String {
    let mut combined: Vec<char> = NUMBER_ESCAPE_CHAR.to_vec();
    if let Some(ec) = escape_chars {
        combined.extend(ec);
    }

    let filters = combined.iter().collect::<HashSet<_>>();
    s.chars().filter(|c| !filters.contains(c)).collect()
}
