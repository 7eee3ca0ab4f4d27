//! Insight commands - uncategorized list, spending, trend, KPIs, months

use anyhow::Result;
use colored::Colorize;

use super::{get_context, parse_month};
use crate::output;

pub fn uncategorized(month: Option<&str>, limit: Option<usize>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let list = ctx.insights_service.uncategorized(parse_month(month)?, limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    if list.transactions.is_empty() {
        output::success(&format!("Everything in {} is categorized", list.month));
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["ID", "Date", "Account", "Merchant", "Description", "Amount"]);
    for tx in &list.transactions {
        table.add_row(vec![
            comfy_table::Cell::new(tx.transaction_id),
            comfy_table::Cell::new(tx.date),
            comfy_table::Cell::new(&tx.account),
            comfy_table::Cell::new(&tx.merchant),
            comfy_table::Cell::new(&tx.description),
            output::amount_cell(tx.amount),
        ]);
    }
    println!("{}", table);
    println!();
    println!("Assign one with: budget categorize <ID> <CATEGORY>");
    Ok(())
}

pub fn spending(month: Option<&str>, top: Option<usize>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let spending = ctx.insights_service.spending_by_category(parse_month(month)?, top);

    if json {
        println!("{}", serde_json::to_string_pretty(&spending)?);
        return Ok(());
    }

    println!("{}", format!("Spending in {}", spending.month).bold());
    if spending.rows.is_empty() {
        println!("No categorized spending.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Category", "Spent"]);
    for row in &spending.rows {
        table.add_row(vec![comfy_table::Cell::new(&row.category_name), output::amount_cell(row.total)]);
    }
    println!("{}", table);
    Ok(())
}

pub fn trend(month: Option<&str>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let trend = ctx.insights_service.spending_trend(parse_month(month)?);

    if json {
        println!("{}", serde_json::to_string_pretty(&trend)?);
        return Ok(());
    }

    println!("{}", format!("Daily totals for {}", trend.month).bold());
    if trend.rows.is_empty() {
        println!("No transactions.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Day", "Income", "Expense"]);
    for point in &trend.rows {
        table.add_row(vec![
            comfy_table::Cell::new(point.day),
            output::amount_cell(point.income),
            output::amount_cell(point.expense),
        ]);
    }
    println!("{}", table);
    Ok(())
}

pub fn kpis(month: Option<&str>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let kpis = ctx.insights_service.kpis(parse_month(month)?);

    if json {
        println!("{}", serde_json::to_string_pretty(&kpis)?);
        return Ok(());
    }

    println!("{}", format!("{} ({})", kpis.month, kpis.currency_code).bold());
    println!("  Income:        {}", output::format_amount(kpis.income).green());
    println!("  Expense:       {}", output::format_amount(kpis.expense).red());
    println!("  Net:           {}", output::format_amount(kpis.net));
    println!("  Transactions:  {}", kpis.transaction_count);
    println!("  Uncategorized: {}", kpis.uncategorized);
    Ok(())
}

pub fn months(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let months: Vec<String> = ctx
        .insights_service
        .available_months()
        .iter()
        .map(|m| m.to_string())
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&months)?);
    } else if months.is_empty() {
        println!("No transactions yet.");
    } else {
        for month in months {
            println!("{}", month);
        }
    }
    Ok(())
}
