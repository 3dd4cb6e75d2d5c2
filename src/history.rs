use std::ops::RangeInclusive;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::{
    calculation::valuation::{AccountCodes, FinancialYear},
    declare::{Period, Quarter, StatementKind},
    logging,
    statement::{Statement, TargetKeys},
};

/// 財報來源
///
/// `Ok(None)` 表示來源沒有這份財報(例如網站回應非 200)。
#[async_trait]
pub trait StatementSource {
    async fn fetch(&self, period: Period, kind: StatementKind) -> Result<Option<Statement>>;
}

/// 單一科目的歷史數值
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub key: String,
    pub values: Vec<Option<i64>>,
}

/// 各目標科目依季度排列的歷史數值
///
/// 每一季在每個科目都剛好有一筆，所有科目的長度永遠等於 `periods` 的長度。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoricalSeries {
    periods: Vec<Period>,
    series: Vec<Series>,
}

impl HistoricalSeries {
    pub fn new(targets: &TargetKeys) -> Self {
        HistoricalSeries {
            periods: Vec::new(),
            series: targets
                .iter()
                .map(|key| Series {
                    key: key.to_string(),
                    values: Vec::new(),
                })
                .collect(),
        }
    }

    /// 記錄一季的數值，`value_of` 查無的科目記為 None
    pub fn push<F>(&mut self, period: Period, value_of: F)
    where
        F: Fn(&str) -> Option<i64>,
    {
        self.periods.push(period);
        for s in self.series.iter_mut() {
            let value = value_of(&s.key);
            s.values.push(value);
        }
    }

    /// 整季抓取失敗，每個科目補一筆 None 以維持對齊
    pub fn push_missing(&mut self, period: Period) {
        self.push(period, |_| None);
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn get(&self, key: &str) -> Option<&[Option<i64>]> {
        self.series
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.values.as_slice())
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// 依序抓取每一季的三張財報，收集目標科目的歷史數值
///
/// 同一季中以先抓到的報表為準(資產負債表、綜合損益表、現金流量表)；
/// 三張都抓不到時每個科目補一筆 None。
pub async fn collect<S>(
    source: &S,
    targets: &TargetKeys,
    periods: impl IntoIterator<Item = Period>,
) -> HistoricalSeries
where
    S: StatementSource + ?Sized,
{
    let mut history = HistoricalSeries::new(targets);

    for period in periods {
        let mut statements = Vec::with_capacity(3);

        for kind in StatementKind::iter() {
            match source.fetch(period, kind).await {
                Ok(Some(statement)) => statements.push(statement.retain_targets(targets)),
                Ok(None) => {}
                Err(why) => {
                    logging::error_file_async(format!(
                        "Failed to fetch {} {} because {:?}",
                        period,
                        kind.name(),
                        why
                    ));
                }
            }
        }

        if statements.is_empty() {
            logging::warn_file_async(format!("no statement available for {}", period));
            history.push_missing(period);
            continue;
        }

        history.push(period, |key| {
            statements.iter().find_map(|s| s.value(key)).flatten()
        });
    }

    history
}

/// 以每年第四季的資產負債表與綜合損益表組出年度財務數據
///
/// 任一張抓不到的年度會被略過。
pub async fn collect_annual<S>(
    source: &S,
    accounts: &AccountCodes,
    years: RangeInclusive<i32>,
) -> Vec<FinancialYear>
where
    S: StatementSource + ?Sized,
{
    let mut table = Vec::new();

    for year in years {
        let period = Period::new(year, Quarter::Q4);
        let mut statements = Vec::with_capacity(2);

        for kind in [StatementKind::BalanceSheet, StatementKind::ComprehensiveIncome] {
            match source.fetch(period, kind).await {
                Ok(Some(statement)) => statements.push(statement),
                Ok(None) => {}
                Err(why) => {
                    logging::error_file_async(format!(
                        "Failed to fetch {} {} because {:?}",
                        period,
                        kind.name(),
                        why
                    ));
                }
            }
        }

        if statements.len() < 2 {
            logging::warn_file_async(format!("skip {} because the statements are incomplete", year));
            continue;
        }

        table.push(FinancialYear::from_statements(year, &statements, accounts));
    }

    table
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use anyhow::anyhow;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::statement::FinancialRow;

    /// 依照季度與報表種類回傳固定內容的來源
    #[derive(Default)]
    struct StubSource {
        /// 回傳 Ok(None) 的季度
        not_found: HashSet<Period>,
        /// 回傳 Err 的季度
        broken: HashSet<Period>,
        /// 只有特定報表回傳 Err 的季度
        broken_kinds: HashSet<(Period, StatementKind)>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StatementSource for StubSource {
        async fn fetch(&self, period: Period, kind: StatementKind) -> Result<Option<Statement>> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if self.broken.contains(&period) || self.broken_kinds.contains(&(period, kind)) {
                return Err(anyhow!("connection reset"));
            }

            if self.not_found.contains(&period) {
                return Ok(None);
            }

            let base = i64::from(period.year) * 10 + i64::from(period.quarter.serial());
            let rows = match kind {
                StatementKind::BalanceSheet => vec![
                    FinancialRow::new("1100".to_string(), "現金及約當現金".to_string(), Some(base)),
                    FinancialRow::new("3XXX".to_string(), "權益總額".to_string(), Some(base * 100)),
                    FinancialRow::new("2100".to_string(), "短期借款".to_string(), None),
                ],
                StatementKind::ComprehensiveIncome => vec![
                    FinancialRow::new("4000".to_string(), "營業收入合計".to_string(), Some(-base)),
                    FinancialRow::new("7900".to_string(), "稅前淨利".to_string(), Some(base * 10)),
                    FinancialRow::new("7950".to_string(), "所得稅費用".to_string(), Some(base * 2)),
                ],
                // 與資產負債表同代號的列，不應覆蓋先抓到的數值
                StatementKind::CashFlows => vec![FinancialRow::new(
                    "1100".to_string(),
                    "期末現金".to_string(),
                    Some(0),
                )],
            };

            Ok(Some(rows.into_iter().collect()))
        }
    }

    #[tokio::test]
    async fn test_collect() {
        let source = StubSource::default();
        let targets = TargetKeys::new(["1100", "營業收入合計", "2100", "9999"]);

        let history = collect(&source, &targets, Period::range(2013..=2014)).await;

        assert_eq!(history.len(), 8);
        assert_eq!(source.calls.load(Ordering::SeqCst), 8 * 3);
        assert_eq!(history.periods()[0], Period::new(2013, Quarter::Q1));

        let cash = history.get("1100").unwrap();
        assert_eq!(cash[0], Some(20131));
        assert_eq!(cash[7], Some(20144));
        assert_eq!(history.get("營業收入合計").unwrap()[1], Some(-20132));
        assert!(history.get("2100").unwrap().iter().all(Option::is_none));
        assert!(history.get("9999").unwrap().iter().all(Option::is_none));
    }

    #[tokio::test]
    async fn test_collect_keeps_alignment_on_failure() {
        let source = StubSource {
            not_found: HashSet::from([Period::new(2013, Quarter::Q2)]),
            broken: HashSet::from([Period::new(2013, Quarter::Q4)]),
            ..Default::default()
        };
        let targets = TargetKeys::new(["1100", "4000"]);

        let history = collect(&source, &targets, Period::range(2013..=2013)).await;

        assert_eq!(history.len(), 4);
        for s in history.series() {
            assert_eq!(s.values.len(), 4);
            assert_eq!(s.values[1], None);
            assert_eq!(s.values[3], None);
        }
        assert_eq!(history.get("1100").unwrap()[0], Some(20131));
        assert_eq!(history.get("4000").unwrap()[2], Some(-20133));
    }

    #[tokio::test]
    async fn test_collect_with_one_statement_broken() {
        let q3 = Period::new(2013, Quarter::Q3);
        let source = StubSource {
            broken_kinds: HashSet::from([(q3, StatementKind::BalanceSheet)]),
            ..Default::default()
        };
        let targets = TargetKeys::new(["3XXX", "4000", "7900"]);

        let history = collect(&source, &targets, Period::range(2013..=2013)).await;

        assert_eq!(history.len(), 4);
        assert_eq!(source.calls.load(Ordering::SeqCst), 4 * 3);
        for s in history.series() {
            assert_eq!(s.values.len(), 4);
        }

        let equity = history.get("3XXX").unwrap();
        assert_eq!(equity[2], None);
        assert_eq!(equity[1], Some(2013200));
        assert_eq!(history.get("4000").unwrap()[2], Some(-20133));
        assert_eq!(history.get("7900").unwrap()[2], Some(201330));
    }

    #[tokio::test]
    async fn test_collect_without_periods() {
        let source = StubSource::default();
        let targets = TargetKeys::new(["1100"]);

        let history = collect(&source, &targets, Vec::new()).await;

        assert!(history.is_empty());
        assert_eq!(history.get("1100").unwrap().len(), 0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_collect_annual() {
        let source = StubSource {
            not_found: HashSet::from([Period::new(2014, Quarter::Q4)]),
            ..Default::default()
        };

        let table = collect_annual(&source, &AccountCodes::default(), 2013..=2015).await;

        assert_eq!(table.len(), 2);
        assert_eq!(table[0].year, 2013);
        assert_eq!(table[0].revenue, dec!(-20134));
        assert_eq!(table[0].equity, dec!(2013400));
        assert_eq!(table[0].short_term_debt, dec!(0));
        assert_eq!(table[0].tax_rate(), Some(dec!(0.2)));
        assert_eq!(table[1].year, 2015);
        assert_eq!(source.calls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_serialize() {
        let mut history = HistoricalSeries::new(&TargetKeys::new(["1100"]));
        history.push(Period::new(2013, Quarter::Q1), |_| Some(1));
        history.push_missing(Period::new(2013, Quarter::Q2));

        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(json["series"][0]["key"], "1100");
        assert_eq!(json["series"][0]["values"], serde_json::json!([1, null]));
        assert_eq!(json["periods"][1]["quarter"], "Q2");
    }
}
