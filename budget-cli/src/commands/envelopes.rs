//! Envelopes command - monthly budgets and category assignment

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{get_context, parse_month};
use crate::output;
use budget_core::Month;

#[derive(Subcommand)]
pub enum EnvelopeCommands {
    /// Budgeted, spent and remaining per expense category
    Summary {
        /// Month as YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the budget for a category
    Set {
        /// Category name (created if missing)
        category: String,
        /// Budgeted amount; negative values are stored as 0
        #[arg(allow_hyphen_values = true)]
        amount: Decimal,
        /// Month as YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: EnvelopeCommands) -> Result<()> {
    let ctx = get_context()?;

    match command {
        EnvelopeCommands::Summary { month, json } => {
            let month = parse_month(month.as_deref())?.unwrap_or_else(Month::current);
            let summary = ctx.envelope_service.summary(month);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            println!("{}", format!("Envelopes for {}", summary.month).bold());
            println!();

            if summary.items.is_empty() {
                println!("No expense categories yet. Import transactions or run 'budget envelopes set'.");
            } else {
                let mut table = output::create_table();
                table.set_header(vec!["Category", "Budgeted", "Spent", "Remaining"]);
                for item in &summary.items {
                    let remaining = if item.remaining < Decimal::ZERO {
                        output::format_amount(item.remaining).red().to_string()
                    } else {
                        output::format_amount(item.remaining)
                    };
                    table.add_row(vec![
                        comfy_table::Cell::new(&item.category_name),
                        output::amount_cell(item.budgeted),
                        output::amount_cell(item.spent),
                        comfy_table::Cell::new(remaining).set_alignment(comfy_table::CellAlignment::Right),
                    ]);
                }
                println!("{}", table);
            }

            if summary.uncategorized_count > 0 {
                println!();
                output::warning(&format!(
                    "{} transaction(s) need a category. Run 'budget uncategorized'.",
                    summary.uncategorized_count
                ));
            }
            Ok(())
        }
        EnvelopeCommands::Set {
            category,
            amount,
            month,
            json,
        } => {
            let month = parse_month(month.as_deref())?.unwrap_or_else(Month::current);
            let result = ctx.envelope_service.set_budget(month, &category, amount)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                output::success(&format!(
                    "Budget for {} in {} set to {}",
                    category.trim(),
                    result.month,
                    output::format_amount(result.budgeted)
                ));
            }
            Ok(())
        }
    }
}

/// Assign a transaction wholly to a category
pub fn categorize(transaction_id: &str, category: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let id = Uuid::parse_str(transaction_id.trim())
        .with_context(|| format!("Invalid UUID: {}", transaction_id))?;
    let result = ctx.envelope_service.categorize_transaction(id, category)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        output::success(&format!("Categorized {} as {}", result.transaction_id, category.trim()));
    }
    Ok(())
}
