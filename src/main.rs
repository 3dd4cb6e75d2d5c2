use std::{env, str::FromStr};

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;

use crate::{
    calculation::valuation::{self, Ratios},
    config::SETTINGS,
    crawler::{goodinfo, twse::financial_report::Mops},
    declare::{Command, Period},
    statement::TargetKeys,
};

pub mod calculation;
pub mod config;
pub mod crawler;
pub mod declare;
pub mod history;
pub mod logging;
pub mod statement;
pub mod util;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let arg = env::args().nth(1).unwrap_or_else(|| Command::History.to_string());
    let command = Command::from_str(&arg).map_err(|_| {
        anyhow!(
            "unknown command '{}', expected one of: history, beta, ratio, annual",
            arg
        )
    })?;

    logging::info_file_async(format!(
        "start {} for {}",
        command, SETTINGS.stock.code
    ));

    let result = match command {
        Command::History => run_history().await,
        Command::Beta => run_beta().await.map(|_| ()),
        Command::Ratio => run_ratio().await,
        Command::Annual => run_annual().await,
    };

    if let Err(why) = &result {
        logging::error_file_async(format!("{} failed because {:?}", command, why));
    }

    tokio::task::spawn_blocking(logging::flush).await?;

    result
}

/// 逐季收集目標科目並以 JSON 輸出
async fn run_history() -> Result<()> {
    let settings = &SETTINGS.history;
    let targets = TargetKeys::new(settings.targets.iter().cloned());
    let source = Mops::new(SETTINGS.stock.code.as_str());

    let series = history::collect(&source, &targets, Period::range(settings.years())).await;

    println!("{}", serde_json::to_string_pretty(&series)?);

    Ok(())
}

/// 抓取 5 年 Beta，回傳 CAPM 股東權益成本
async fn run_beta() -> Result<Decimal> {
    let settings = &SETTINGS.valuation;
    let stock_code = SETTINGS.stock.code.as_str();

    let beta = match goodinfo::beta::visit(stock_code).await {
        Ok(Some(beta)) => beta,
        Ok(None) => settings.default_beta,
        Err(why) => {
            logging::error_console(format!("Failed to fetch beta because {:?}", why));
            settings.default_beta
        }
    };

    let ke = valuation::cost_of_equity(settings.risk_free_rate, beta, settings.market_return);

    logging::info_console(valuation::beta_summary(beta, ke));

    Ok(ke)
}

/// 以設定檔的年度財務數據(未設定時用內建範例)計算比率
async fn run_ratio() -> Result<()> {
    let ke = run_beta().await?;
    let table = if SETTINGS.valuation.table.is_empty() {
        valuation::sample_table()
    } else {
        SETTINGS.valuation.table.clone()
    };

    print_ratios(&table.iter().map(|fy| fy.ratios(ke)).collect::<Vec<_>>());

    Ok(())
}

/// 以 MOPS 第四季財報組出年度財務數據後計算比率
async fn run_annual() -> Result<()> {
    let ke = run_beta().await?;
    let source = Mops::new(SETTINGS.stock.code.as_str());
    let table = history::collect_annual(
        &source,
        &SETTINGS.valuation.accounts,
        SETTINGS.history.years(),
    )
    .await;

    if table.is_empty() {
        return Err(anyhow!(
            "no annual statement available for {}",
            SETTINGS.stock.code
        ));
    }

    print_ratios(&table.iter().map(|fy| fy.ratios(ke)).collect::<Vec<_>>());

    Ok(())
}

fn print_ratios(ratios: &[Ratios]) {
    println!("{} ROIC / WACC / 毛利率", SETTINGS.stock.code);
    print!("{}", valuation::render(ratios));
}
