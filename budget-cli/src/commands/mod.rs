//! CLI command implementations

pub mod demo;
pub mod envelopes;
pub mod import;
pub mod insights;
pub mod logs;
pub mod settings;
pub mod status;
pub mod tag;
pub mod tool;
pub mod upload;

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use budget_core::{BudgetContext, EntryPoint, LogEvent, LoggingService, Month};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let data_dir = get_data_dir().ok()?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the data directory from BUDGET_DIR or default to ~/.budget-analyzer
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("BUDGET_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".budget-analyzer"))
}

/// Get or create the budget context
pub fn get_context() -> Result<BudgetContext> {
    let data_dir = get_data_dir()?;

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    BudgetContext::new(&data_dir).context("Failed to initialize budget context")
}

/// Parse an optional `YYYY-MM` argument
pub fn parse_month(month: Option<&str>) -> Result<Option<Month>> {
    month
        .map(|m| m.parse::<Month>().map_err(|e| anyhow::anyhow!("{}", e)))
        .transpose()
}

/// Read CSV text from a file, or from stdin when no path is given and
/// input is piped
pub fn read_csv_input(file: Option<&Path>) -> Result<(String, String)> {
    match file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            Ok((text, filename))
        }
        None if atty::isnt(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok((buffer, budget_core::services::import::DEFAULT_UPLOAD_FILENAME.to_string()))
        }
        None => anyhow::bail!("No CSV provided. Pass a file path or pipe CSV on stdin."),
    }
}
