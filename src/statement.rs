use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::util::text;

/// 財報中的一列
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinancialRow {
    /// 會計科目代號
    pub account_code: String,
    /// 會計科目名稱(只保留開頭的中文)
    pub account_name: String,
    /// 金額，無法解析時為 None
    pub value: Option<i64>,
}

impl FinancialRow {
    pub fn new(account_code: String, account_name: String, value: Option<i64>) -> Self {
        FinancialRow {
            account_code,
            account_name,
            value,
        }
    }

    /// 由表格的代號、名稱、金額三個欄位組出一列
    pub fn from_cells(code: &str, name: &str, value: &str) -> Self {
        FinancialRow::new(
            code.trim().to_string(),
            text::leading_cjk(name),
            text::parse_accounting_i64(value),
        )
    }
}

/// 一張財務報表
///
/// `by_code` 與 `by_name` 指向相同的金額；代號重複時後出現的覆蓋先出現的。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    rows: Vec<FinancialRow>,
    by_code: HashMap<String, Option<i64>>,
    by_name: HashMap<String, Option<i64>>,
}

impl Statement {
    pub fn new() -> Self {
        Default::default()
    }

    /// 加入一列，代號為空的列不收錄
    pub fn push(&mut self, row: FinancialRow) {
        if row.account_code.is_empty() {
            return;
        }

        self.by_code.insert(row.account_code.clone(), row.value);
        self.by_name.insert(row.account_name.clone(), row.value);
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[FinancialRow] {
        &self.rows
    }

    pub fn by_code(&self) -> &HashMap<String, Option<i64>> {
        &self.by_code
    }

    pub fn by_name(&self) -> &HashMap<String, Option<i64>> {
        &self.by_name
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 依代號查詢，查無時再依名稱查詢
    ///
    /// 外層 `None` 表示報表沒有這個科目，內層 `None` 表示科目存在但金額無法解析。
    pub fn value(&self, key: &str) -> Option<Option<i64>> {
        self.by_code
            .get(key)
            .or_else(|| self.by_name.get(key))
            .copied()
    }

    /// 只保留代號或名稱在目標清單內的列
    pub fn retain_targets(self, targets: &TargetKeys) -> Statement {
        self.rows
            .into_iter()
            .filter(|row| targets.contains(&row.account_code) || targets.contains(&row.account_name))
            .collect()
    }
}

impl FromIterator<FinancialRow> for Statement {
    fn from_iter<I: IntoIterator<Item = FinancialRow>>(iter: I) -> Self {
        let mut statement = Statement::new();
        for row in iter {
            statement.push(row);
        }
        statement
    }
}

/// 要追蹤的會計科目(代號或名稱)，保留設定時的順序並去除重複
#[derive(Debug, Clone, Default)]
pub struct TargetKeys {
    keys: Vec<String>,
    set: HashSet<String>,
}

impl TargetKeys {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut targets = TargetKeys::default();
        for key in keys {
            let key = key.into();
            if targets.set.insert(key.clone()) {
                targets.keys.push(key);
            }
        }
        targets
    }

    pub fn contains(&self, key: &str) -> bool {
        self.set.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
