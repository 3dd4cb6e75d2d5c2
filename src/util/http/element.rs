use anyhow::{anyhow, Result};
use scraper::{ElementRef, Selector};

/// Parses a CSS selector, turning the borrowed parse error into an `anyhow::Error`.
pub fn selector(css_selector: &str) -> Result<Selector> {
    Selector::parse(css_selector)
        .map_err(|why| anyhow!("Failed to Selector::parse({}) because: {:?}", css_selector, why))
}

/// Extracts the text value of the first element selected by a given CSS selector.
///
/// Returns `None` when the selector is invalid or nothing matches.
///
/// ```
/// let html = r#"<div class="example">Hello, world!</div>"#;
/// let document = Html::parse_fragment(html);
/// let root = document.root_element();
///
/// assert_eq!(parse_value(&root, "div.example"), Some("Hello, world!".to_string()));
/// ```
pub fn parse_value(element: &ElementRef, css_selector: &str) -> Option<String> {
    match Selector::parse(css_selector) {
        Ok(s) => element
            .select(&s)
            .next()
            .map(|v| v.text().collect::<String>()),
        Err(_) => None,
    }
}

/// 取出 `tr` 底下直接的 `td` 欄位文字(已去除前後空白)，不含巢狀表格的欄位
pub fn cells(tr: &ElementRef) -> Vec<String> {
    tr.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "td")
        .map(|td| td.text().collect::<String>().trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    #[test]
    fn test_parse_value() {
        let document = Html::parse_fragment(r#"<div class="example"><a>1.23</a></div>"#);
        let root = document.root_element();

        assert_eq!(parse_value(&root, "div.example > a"), Some("1.23".to_string()));
        assert_eq!(parse_value(&root, "span"), None);
        assert_eq!(parse_value(&root, "[[invalid"), None);
    }

    #[test]
    fn test_cells() {
        let document = Html::parse_document(
            "<table><tr><td> 1100 </td><th>header</th><td>\u{3000}現金</td><td>1,000</td></tr></table>",
        );
        let tr_selector = selector("tr").unwrap();
        let tr = document.select(&tr_selector).next().unwrap();

        assert_eq!(cells(&tr), vec!["1100", "現金", "1,000"]);
    }

    #[test]
    fn test_selector_error() {
        assert!(selector("[[invalid").is_err());
    }
}
