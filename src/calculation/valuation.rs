use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::statement::Statement;

/// CAPM 股東權益成本 Ke = Rf + β × (Rm − Rf)
pub fn cost_of_equity(risk_free_rate: Decimal, beta: Decimal, market_return: Decimal) -> Decimal {
    risk_free_rate + beta * (market_return - risk_free_rate)
}

/// 加權平均資金成本
///
/// 權益與負債合計為零時無法計算，回傳 `None`。
pub fn weighted_average_cost_of_capital(
    equity: Decimal,
    debt: Decimal,
    ke: Decimal,
    kd: Decimal,
    tax_rate: Decimal,
) -> Option<Decimal> {
    let capital = equity + debt;
    let equity_weight = equity.checked_div(capital)?;
    let debt_weight = debt.checked_div(capital)?;

    Some(equity_weight * ke + debt_weight * kd * (Decimal::ONE - tax_rate))
}

/// 一個年度的財務數據
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialYear {
    pub year: i32,
    /// 營收
    pub revenue: Decimal,
    /// 毛利
    pub gross_profit: Decimal,
    /// 稅前淨利
    pub income_before_tax: Decimal,
    /// 所得稅
    pub income_tax: Decimal,
    /// 股東權益
    pub equity: Decimal,
    /// 短期借款
    pub short_term_debt: Decimal,
    /// 長期借款
    pub long_term_debt: Decimal,
    /// 利息費用
    pub interest_expense: Decimal,
}

impl FinancialYear {
    pub fn gross_margin(&self) -> Option<Decimal> {
        self.gross_profit.checked_div(self.revenue)
    }

    pub fn debt(&self) -> Decimal {
        self.short_term_debt + self.long_term_debt
    }

    pub fn tax_rate(&self) -> Option<Decimal> {
        self.income_tax.checked_div(self.income_before_tax)
    }

    /// 負債成本 Kd
    pub fn cost_of_debt(&self) -> Option<Decimal> {
        self.interest_expense.checked_div(self.debt())
    }

    pub fn nopat(&self) -> Option<Decimal> {
        Some(self.income_before_tax * (Decimal::ONE - self.tax_rate()?))
    }

    pub fn roic(&self) -> Option<Decimal> {
        self.nopat()?.checked_div(self.equity + self.debt())
    }

    pub fn wacc(&self, ke: Decimal) -> Option<Decimal> {
        weighted_average_cost_of_capital(
            self.equity,
            self.debt(),
            ke,
            self.cost_of_debt()?,
            self.tax_rate()?,
        )
    }

    pub fn ratios(&self, ke: Decimal) -> Ratios {
        Ratios {
            year: self.year,
            gross_margin: self.gross_margin(),
            debt: self.debt(),
            tax_rate: self.tax_rate(),
            kd: self.cost_of_debt(),
            wacc: self.wacc(ke),
            nopat: self.nopat(),
            roic: self.roic(),
        }
    }

    /// 由同一年度的財報組出財務數據，查無的科目以 0 計
    ///
    /// 財報上的財務成本以括號(負數)表示，利息費用一律取絕對值。
    pub fn from_statements(year: i32, statements: &[Statement], accounts: &AccountCodes) -> Self {
        let amount = |code: &str| -> Decimal {
            statements
                .iter()
                .find_map(|s| s.value(code))
                .flatten()
                .map(Decimal::from)
                .unwrap_or_default()
        };

        FinancialYear {
            year,
            revenue: amount(&accounts.revenue),
            gross_profit: amount(&accounts.gross_profit),
            income_before_tax: amount(&accounts.income_before_tax),
            income_tax: amount(&accounts.income_tax),
            equity: amount(&accounts.equity),
            short_term_debt: amount(&accounts.short_term_debt),
            long_term_debt: amount(&accounts.long_term_debt),
            interest_expense: amount(&accounts.interest_expense).abs(),
        }
    }
}

/// 計算後的比率，分母為零時為 `None`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ratios {
    pub year: i32,
    pub gross_margin: Option<Decimal>,
    pub debt: Decimal,
    pub tax_rate: Option<Decimal>,
    pub kd: Option<Decimal>,
    pub wacc: Option<Decimal>,
    pub nopat: Option<Decimal>,
    pub roic: Option<Decimal>,
}

/// 財報中對應各欄位的會計科目代號
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountCodes {
    pub revenue: String,
    pub gross_profit: String,
    pub income_before_tax: String,
    pub income_tax: String,
    pub equity: String,
    pub short_term_debt: String,
    pub long_term_debt: String,
    pub interest_expense: String,
}

impl Default for AccountCodes {
    fn default() -> Self {
        AccountCodes {
            revenue: "4000".to_string(),
            gross_profit: "5900".to_string(),
            income_before_tax: "7900".to_string(),
            income_tax: "7950".to_string(),
            equity: "3XXX".to_string(),
            short_term_debt: "2100".to_string(),
            long_term_debt: "2540".to_string(),
            interest_expense: "7050".to_string(),
        }
    }
}

/// 內建的範例財務數據
///
/// 欄位順序：年度、營收、毛利、稅前淨利、所得稅、股東權益、短期借款、長期借款、利息費用
const SAMPLE_TABLE: [(i32, i64, i64, i64, i64, i64, i64, i64, i64); 5] = [
    (2022, 70_000_000, 15_000_000, 3_000_000, 600_000, 20_000_000, 5_000_000, 7_000_000, 300_000),
    (2021, 65_000_000, 14_000_000, 3_500_000, 700_000, 18_000_000, 4_000_000, 6_500_000, 280_000),
    (2020, 60_000_000, 13_000_000, 2_800_000, 560_000, 17_000_000, 3_500_000, 6_000_000, 250_000),
    (2019, 58_000_000, 12_500_000, 2_500_000, 500_000, 16_000_000, 3_000_000, 5_800_000, 240_000),
    (2018, 54_000_000, 12_000_000, 2_200_000, 440_000, 15_000_000, 2_500_000, 5_500_000, 220_000),
];

pub fn sample_table() -> Vec<FinancialYear> {
    SAMPLE_TABLE
        .iter()
        .map(|&(year, revenue, gross_profit, income_before_tax, income_tax, equity, short_term_debt, long_term_debt, interest_expense)| {
            FinancialYear {
                year,
                revenue: Decimal::from(revenue),
                gross_profit: Decimal::from(gross_profit),
                income_before_tax: Decimal::from(income_before_tax),
                income_tax: Decimal::from(income_tax),
                equity: Decimal::from(equity),
                short_term_debt: Decimal::from(short_term_debt),
                long_term_debt: Decimal::from(long_term_debt),
                interest_expense: Decimal::from(interest_expense),
            }
        })
        .collect()
}

/// 以文字表格輸出 ROIC、WACC、毛利率等比率
pub fn render(ratios: &[Ratios]) -> String {
    let mut out = String::with_capacity(128 * (ratios.len() + 1));
    out.push_str(&format!(
        "{:>6} {:>10} {:>10} {:>10} {:>10} {:>16} {:>10}\n",
        "Year", "ROIC", "WACC", "GrossMargin", "TaxRate", "Debt", "Kd"
    ));

    for r in ratios {
        out.push_str(&format!(
            "{:>6} {:>10} {:>10} {:>10} {:>10} {:>16} {:>10}\n",
            r.year,
            cell(r.roic),
            cell(r.wacc),
            cell(r.gross_margin),
            cell(r.tax_rate),
            r.debt.to_string(),
            cell(r.kd)
        ));
    }

    out
}

/// Beta 與 CAPM 股東權益成本的摘要，Ke 固定四位小數
pub fn beta_summary(beta: Decimal, ke: Decimal) -> String {
    format!("Beta (5y): {}, Ke: {:.4}", beta, ke)
}

fn cell(value: Option<Decimal>) -> String {
    value
        .map(|v| v.round_dp(4).to_string())
        .unwrap_or_else(|| "-".to_string())
}
