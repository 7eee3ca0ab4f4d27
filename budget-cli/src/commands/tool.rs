//! Tool command - run an assistant tool from the terminal

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use super::get_context;
use budget_core::services::TOOL_NAMES;
use budget_core::LogEvent;

pub fn run(name: Option<&str>, args: Option<&str>, file: Option<&Path>) -> Result<()> {
    let Some(name) = name else {
        for tool in TOOL_NAMES {
            println!("{}", tool);
        }
        return Ok(());
    };

    let raw = match (args, file) {
        (Some(args), _) => Some(args.to_string()),
        (None, Some(path)) => Some(
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        (None, None) => None,
    };
    let args: Value = match raw {
        Some(raw) => serde_json::from_str(&raw).context("Tool arguments must be JSON")?,
        None => Value::Null,
    };

    let ctx = get_context()?;
    let result = ctx.tool_service.call(name, args);

    let logger = super::get_logger();
    let mut event = LogEvent::new("tool_called").with_integration("tools").with_command(name);
    if let Some(error) = &result.error {
        event = event.with_error(error.clone());
    }
    super::log_event(&logger, event);

    println!("{}", serde_json::to_string_pretty(&result)?);
    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
