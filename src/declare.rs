use std::{fmt, ops::RangeInclusive};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// 季度
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum Quarter {
    /// 第一季 1
    Q1,
    /// 第二季 2
    Q2,
    /// 第三季 3
    Q3,
    /// 第四季 4
    Q4,
}

impl Quarter {
    pub fn serial(&self) -> i32 {
        match self {
            Quarter::Q1 => 1,
            Quarter::Q2 => 2,
            Quarter::Q3 => 3,
            Quarter::Q4 => 4,
        }
    }
}

/// 財務報表種類
///
/// 每張報表在 MOPS 報表頁中的位置是固定的，`table_index` 即為該位置。
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum StatementKind {
    /// 資產負債表 1
    BalanceSheet,
    /// 綜合損益表 2
    ComprehensiveIncome,
    /// 現金流量表 3
    CashFlows,
}

impl StatementKind {
    pub fn table_index(&self) -> usize {
        match self {
            StatementKind::BalanceSheet => 1,
            StatementKind::ComprehensiveIncome => 2,
            StatementKind::CashFlows => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StatementKind::BalanceSheet => "資產負債表",
            StatementKind::ComprehensiveIncome => "綜合損益表",
            StatementKind::CashFlows => "現金流量表",
        }
    }
}

/// 財報所屬的年度(西元)與季度
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub quarter: Quarter,
}

impl Period {
    pub fn new(year: i32, quarter: Quarter) -> Self {
        Period { year, quarter }
    }

    /// 依時間先後列出區間內每一季
    pub fn range(years: RangeInclusive<i32>) -> impl Iterator<Item = Period> {
        years.flat_map(|year| Quarter::iter().map(move |quarter| Period::new(year, quarter)))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.year, self.quarter)
    }
}

/// 執行的工作
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Command {
    /// 逐季收集指定科目的歷史數值
    History,
    /// 抓取 Beta 並計算股東權益成本
    Beta,
    /// 以設定檔(或內建範例)的年度財務數據計算比率
    Ratio,
    /// 以 MOPS 第四季財報組出年度財務數據後計算比率
    Annual,
}
