use std::{env, ops::RangeInclusive, path::PathBuf, str::FromStr};

use anyhow::Result;
use config::{Config as config_config, File as config_file};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::{
    calculation::valuation::{AccountCodes, FinancialYear},
    logging,
    util::datetime,
};

const CONFIG_PATH: &str = "app.json";

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct App {
    #[serde(default)]
    pub stock: Stock,
    #[serde(default)]
    pub valuation: Valuation,
    #[serde(default)]
    pub history: History,
    #[serde(default)]
    pub http: Http,
}

const STOCK_CODE: &str = "STOCK_CODE";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Stock {
    /// 台股股票代號
    pub code: String,
}

impl Default for Stock {
    fn default() -> Self {
        Stock {
            code: "2330".to_string(),
        }
    }
}

const RISK_FREE_RATE: &str = "RISK_FREE_RATE";
const MARKET_RETURN: &str = "MARKET_RETURN";
const DEFAULT_BETA: &str = "DEFAULT_BETA";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Valuation {
    /// 無風險利率 (10年公債)
    pub risk_free_rate: Decimal,
    /// 市場報酬率
    pub market_return: Decimal,
    /// 抓不到 Beta 時使用的值
    pub default_beta: Decimal,
    /// `ratio` 使用的年度財務數據，空的時候使用內建範例
    pub table: Vec<FinancialYear>,
    /// `annual` 從財報取值時使用的會計科目代號
    pub accounts: AccountCodes,
}

impl Default for Valuation {
    fn default() -> Self {
        Valuation {
            risk_free_rate: dec!(0.015),
            market_return: dec!(0.08),
            default_beta: dec!(1),
            table: Vec::new(),
            accounts: AccountCodes::default(),
        }
    }
}

const HISTORY_START_ROC_YEAR: &str = "HISTORY_START_ROC_YEAR";
const HISTORY_END_YEAR: &str = "HISTORY_END_YEAR";
const HISTORY_TARGETS: &str = "HISTORY_TARGETS";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct History {
    /// 起始年度(民國)，102 年起為 IFRS 格式的財報
    pub start_roc_year: i32,
    /// 結束年度(西元)，未設定時為今年
    pub end_year: Option<i32>,
    /// 要收集的會計科目代號或名稱
    pub targets: Vec<String>,
}

impl Default for History {
    fn default() -> Self {
        History {
            start_roc_year: 102,
            end_year: None,
            targets: vec!["1100".to_string(), "營業收入合計".to_string()],
        }
    }
}

impl History {
    /// 收集的西元年度區間，包含結束年度
    pub fn years(&self) -> RangeInclusive<i32> {
        let start = datetime::roc_to_gregorian_year(self.start_roc_year);
        let end = self.end_year.unwrap_or_else(datetime::current_year);
        start..=end
    }
}

const HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Http {
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
}

impl Default for Http {
    fn default() -> Self {
        Http {
            connect_timeout_secs: 8,
            timeout_secs: 30,
        }
    }
}

pub static SETTINGS: Lazy<App> = Lazy::new(App::load);

impl App {
    fn load() -> Self {
        App::get().unwrap_or_else(|why| {
            logging::error_console(format!(
                "I can't read the config({}) because {:?}",
                CONFIG_PATH, why
            ));
            App::default().override_with_env()
        })
    }

    fn get() -> Result<Self> {
        let config_path = config_path();
        if config_path.exists() {
            let config: App = config_config::builder()
                .add_source(config_file::from(config_path))
                .build()?
                .try_deserialize()?;
            return Ok(config.override_with_env());
        }

        Ok(App::default().override_with_env())
    }

    /// 將來至於 env 的設定值覆蓋掉 json 上的設定值
    fn override_with_env(mut self) -> Self {
        if let Ok(code) = env::var(STOCK_CODE) {
            self.stock.code = code;
        }

        if let Some(rate) = env_parse::<Decimal>(RISK_FREE_RATE) {
            self.valuation.risk_free_rate = rate;
        }

        if let Some(rate) = env_parse::<Decimal>(MARKET_RETURN) {
            self.valuation.market_return = rate;
        }

        if let Some(beta) = env_parse::<Decimal>(DEFAULT_BETA) {
            self.valuation.default_beta = beta;
        }

        if let Some(year) = env_parse::<i32>(HISTORY_START_ROC_YEAR) {
            self.history.start_roc_year = year;
        }

        if let Some(year) = env_parse::<i32>(HISTORY_END_YEAR) {
            self.history.end_year = Some(year);
        }

        if let Ok(targets) = env::var(HISTORY_TARGETS) {
            let targets = split_targets(&targets);
            if !targets.is_empty() {
                self.history.targets = targets;
            }
        }

        if let Some(secs) = env_parse::<u64>(HTTP_TIMEOUT_SECS) {
            self.http.timeout_secs = secs;
        }

        self
    }
}

/// 回傳設定檔的路徑
fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_PATH)
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| T::from_str(v.trim()).ok())
}

fn split_targets(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let app = App::default();

        assert_eq!(app.stock.code, "2330");
        assert_eq!(app.valuation.risk_free_rate, dec!(0.015));
        assert_eq!(app.valuation.market_return, dec!(0.08));
        assert_eq!(app.valuation.default_beta, dec!(1));
        assert!(app.valuation.table.is_empty());
        assert_eq!(app.history.start_roc_year, 102);
        assert_eq!(app.history.targets, vec!["1100", "營業收入合計"]);
    }

    #[test]
    fn test_history_years() {
        let history = History {
            start_roc_year: 102,
            end_year: Some(2015),
            targets: Vec::new(),
        };

        assert_eq!(history.years(), 2013..=2015);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let json = r#"{
            "stock": { "code": "1231" },
            "valuation": { "risk_free_rate": "0.02" },
            "history": { "targets": ["2100"] }
        }"#;
        let app: App = serde_json::from_str(json).unwrap();

        assert_eq!(app.stock.code, "1231");
        assert_eq!(app.valuation.risk_free_rate, dec!(0.02));
        assert_eq!(app.valuation.market_return, dec!(0.08));
        assert_eq!(app.history.start_roc_year, 102);
        assert_eq!(app.history.targets, vec!["2100"]);
        assert_eq!(app.http.timeout_secs, 30);
    }

    #[test]
    fn test_split_targets() {
        assert_eq!(
            split_targets(" 1100, 營業收入合計 ,,"),
            vec!["1100".to_string(), "營業收入合計".to_string()]
        );
        assert!(split_targets(" , ").is_empty());
    }

    #[test]
    fn test_env_parse() {
        env::set_var("STOCK_VALUATION_TEST_RATE", " 0.03 ");
        assert_eq!(
            env_parse::<Decimal>("STOCK_VALUATION_TEST_RATE"),
            Some(dec!(0.03))
        );
        assert_eq!(env_parse::<i32>("STOCK_VALUATION_TEST_MISSING"), None);
    }
}
