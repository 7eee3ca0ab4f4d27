//! Settings and reset commands

use anyhow::Result;
use colored::Colorize;
use dialoguer::Confirm;

use super::get_context;
use crate::output;

pub fn run(currency: Option<&str>, account_type: Option<&str>, json: bool) -> Result<()> {
    let ctx = get_context()?;

    if let Some(code) = currency {
        let code = ctx.ledger.set_default_currency_code(code)?;
        if !json {
            output::success(&format!("Default currency set to {}", code));
        }
    }
    if let Some(account_type) = account_type {
        let account_type = ctx.ledger.set_default_account_type(account_type)?;
        if !json {
            output::success(&format!("New accounts will be created as '{}'", account_type));
        }
    }

    let settings = ctx.store.get().settings.clone();
    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    if currency.is_none() && account_type.is_none() {
        println!("{}", "Settings".bold());
        println!("  Default currency:     {}", settings.default_currency_code);
        println!("  Default account type: {}", settings.default_account_type);
        println!("  Demo mode:            {}", if ctx.config.demo_mode { "on" } else { "off" });
        println!("  Data directory:       {}", ctx.data_dir.display());
    }
    Ok(())
}

pub fn reset(force: bool) -> Result<()> {
    let ctx = get_context()?;

    if !force
        && !Confirm::new()
            .with_prompt("Delete all accounts, transactions, budgets and import history?")
            .default(false)
            .interact()?
    {
        println!("Cancelled.");
        return Ok(());
    }

    ctx.ledger.reset()?;
    output::warning("All budgeting data deleted");
    Ok(())
}
