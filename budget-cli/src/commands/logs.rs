//! Logs command - inspect and trim the event log (logs.jsonl)

use std::path::PathBuf;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use clap::{ArgGroup, Subcommand};
use colored::Colorize;
use dialoguer::Confirm;

use super::get_data_dir;
use crate::output;
use budget_core::services::{LogEntry, LogStats};
use budget_core::{EntryPoint, LoggingService};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries, newest first
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Show only entries with an error
        #[arg(long)]
        errors: bool,
        /// Show only entries for this command
        #[arg(long)]
        command: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Per-command run and failure counts, event counts and file size
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Shrink the log file by age or by entry count
    #[command(group(ArgGroup::new("bound").required(true).args(["older_than_days", "keep"])))]
    Trim {
        /// Delete entries older than N days
        #[arg(long)]
        older_than_days: Option<u32>,
        /// Keep only the newest N entries
        #[arg(long)]
        keep: Option<usize>,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Copy the log file elsewhere, e.g. to attach to a bug report
    Export {
        /// Destination path
        path: PathBuf,
    },
}

pub fn run(command: LogsCommands) -> Result<()> {
    let service = LoggingService::new(&get_data_dir()?, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))?;

    match command {
        LogsCommands::List {
            limit,
            errors,
            command,
            json,
        } => list(&service, limit, errors, command.as_deref(), json),
        LogsCommands::Stats { json } => stats(&service, json),
        LogsCommands::Trim {
            older_than_days,
            keep,
            force,
            json,
        } => trim(&service, older_than_days, keep, force, json),
        LogsCommands::Export { path } => {
            let written = service.export(&path)?;
            output::success(&format!("Log exported to {}", written.display()));
            Ok(())
        }
    }
}

fn list(service: &LoggingService, limit: usize, errors: bool, command: Option<&str>, json: bool) -> Result<()> {
    let entries: Vec<LogEntry> = match command {
        // Filter before truncating so the limit applies to matching entries
        Some(name) => service
            .get_recent(usize::MAX)?
            .into_iter()
            .filter(|e| e.command.as_deref() == Some(name))
            .filter(|e| !errors || e.error_message.is_some())
            .take(limit)
            .collect(),
        None if errors => service.get_errors(limit)?,
        None => service.get_recent(limit)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No log entries found.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time", "Event", "Command", "Error"]);
    for entry in &entries {
        table.add_row(vec![
            format_timestamp(entry.timestamp),
            entry.event.clone(),
            entry.command.clone().or_else(|| entry.integration.clone()).unwrap_or_default(),
            entry.error_message.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn stats(service: &LoggingService, json: bool) -> Result<()> {
    let stats = service.stats()?;

    if json {
        let mut value = serde_json::to_value(&stats)?;
        value["log_path"] = serde_json::Value::String(service.log_path().to_string_lossy().into_owned());
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print_summary(service, &stats);

    if !stats.commands.is_empty() {
        println!();
        let mut table = output::create_table();
        table.set_header(vec!["Command", "Runs", "Failures"]);
        for (name, counts) in &stats.commands {
            let failures = if counts.failures > 0 {
                counts.failures.to_string().red().to_string()
            } else {
                "0".to_string()
            };
            table.add_row(vec![name.clone(), counts.runs.to_string(), failures]);
        }
        println!("{}", table);
    }

    let other_events: Vec<_> = stats
        .events
        .iter()
        .filter(|(name, _)| !matches!(name.as_str(), "command_executed" | "command_failed"))
        .collect();
    if !other_events.is_empty() {
        println!();
        println!("{}", "Other events".bold());
        for (name, count) in other_events {
            println!("  {}: {}", name, count);
        }
    }
    Ok(())
}

fn print_summary(service: &LoggingService, stats: &LogStats) {
    println!("{}", "Event log".bold());
    println!("  File: {}", service.log_path().display());
    println!("  Size: {}", output::format_size(stats.size_bytes));
    println!("  Entries: {} ({} with errors)", stats.total, stats.errors);
    if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
        println!("  Span: {} .. {}", format_timestamp(oldest), format_timestamp(newest));
    }
}

fn trim(
    service: &LoggingService,
    older_than_days: Option<u32>,
    keep: Option<usize>,
    force: bool,
    json: bool,
) -> Result<()> {
    let prompt = match (older_than_days, keep) {
        (Some(days), _) => format!("Delete log entries older than {} days?", days),
        (None, Some(n)) => format!("Keep only the newest {} log entries?", n),
        (None, None) => anyhow::bail!("Pass --older-than-days or --keep"),
    };
    if !force && !json && !Confirm::new().with_prompt(prompt).default(false).interact()? {
        println!("Cancelled.");
        return Ok(());
    }

    let deleted = match (older_than_days, keep) {
        (Some(days), _) => service.delete_before(Utc::now().timestamp_millis() - i64::from(days) * MS_PER_DAY)?,
        (None, Some(n)) => service.keep_latest(n)?,
        (None, None) => 0,
    };

    if json {
        println!("{}", serde_json::json!({ "deleted": deleted }));
    } else {
        println!("Deleted {} log entries", deleted);
    }
    Ok(())
}

fn format_timestamp(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
        assert_eq!(format_timestamp(1_704_067_200_000), "2024-01-01 00:00:00");
    }
}
