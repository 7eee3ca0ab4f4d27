//! Status command - show accounts and a summary of stored data

use anyhow::Result;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let status = ctx.status_service.get_status();

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let title = if ctx.config.demo_mode { "Budget Status (demo)" } else { "Budget Status" };
    println!("{}", title.bold());
    println!();

    // Vertical key-value summary
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec!["Accounts", &status.total_accounts.to_string()]);
    table.add_row(vec!["Transactions", &status.total_transactions.to_string()]);
    table.add_row(vec!["Categories", &status.total_categories.to_string()]);
    table.add_row(vec!["Tags", &status.total_tags.to_string()]);
    table.add_row(vec!["Budgets", &status.total_budgets.to_string()]);
    table.add_row(vec!["Import jobs", &status.total_import_jobs.to_string()]);
    table.add_row(vec!["Default currency", &status.default_currency_code]);

    println!("{}", table);
    println!();

    if let (Some(earliest), Some(latest)) = (&status.date_range.earliest, &status.date_range.latest) {
        println!("Date range: {} to {}", earliest, latest);
        println!();
    }

    if !status.accounts.is_empty() {
        let mut accounts = output::create_table();
        accounts.set_header(vec!["Account", "Type", "Currency", "Transactions"]);
        for account in &status.accounts {
            accounts.add_row(vec![
                account.name.clone(),
                account.account_type.clone(),
                account.currency_code.clone().unwrap_or_else(|| "-".to_string()),
                account.transaction_count.to_string(),
            ]);
        }
        println!("{}", accounts);
    }

    Ok(())
}
