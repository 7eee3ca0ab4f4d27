//! Logging service - structured event logging to a JSON-lines file
//!
//! Provides a privacy-safe logging system that appends events to logs.jsonl
//! in the data directory. No user data (amounts, descriptions, account or
//! category names) is ever logged.
//!
//! This service is designed to be used by both CLI and desktop applications.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Log file name inside the data directory
pub const LOG_FILE: &str = "logs.jsonl";

/// Counter for generating unique IDs within the same millisecond
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique ID based on timestamp + counter
fn generate_id() -> u64 {
    let timestamp = now_ms().max(0) as u64;

    // Lower 16 bits hold the counter (65536 unique IDs per millisecond)
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0xFFFF;
    (timestamp << 16) | counter
}

/// Current unix timestamp in milliseconds
fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Detect the current platform
fn detect_platform() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else {
        "unknown"
    }
}

/// Entry point for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    Cli,
    Desktop,
}

impl EntryPoint {
    fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Cli => "cli",
            EntryPoint::Desktop => "desktop",
        }
    }
}

/// A log event to be recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl LogEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            integration: None,
            page: None,
            command: None,
            error_message: None,
            error_details: None,
        }
    }

    /// Set the integration context (e.g. "tools" for the assistant surface)
    pub fn with_integration(mut self, integration: impl Into<String>) -> Self {
        self.integration = Some(integration.into());
        self
    }

    /// Set the page context (for frontend events)
    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    /// Set the command context (for CLI events)
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_error_details(mut self, details: impl Into<String>) -> Self {
        self.error_details = Some(details.into());
        self
    }
}

/// A log entry as stored in the log file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: i64,
    pub entry_point: String,
    pub app_version: String,
    pub platform: String,
    pub event: String,
    #[serde(default)]
    pub integration: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub error_details: Option<String>,
}

/// Run and failure counts of one CLI command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommandStats {
    pub runs: usize,
    pub failures: usize,
}

/// Aggregate view of the log file
#[derive(Debug, Clone, Default, Serialize)]
pub struct LogStats {
    pub total: usize,
    pub errors: usize,
    pub oldest: Option<i64>,
    pub newest: Option<i64>,
    pub size_bytes: u64,
    /// Keyed by command name; `command_executed` counts a run and
    /// `command_failed` a failure
    pub commands: BTreeMap<String, CommandStats>,
    pub events: BTreeMap<String, usize>,
}

/// Service for structured event logging
///
/// One JSON object per line. Unparsable lines are skipped on read.
pub struct LoggingService {
    lock: Mutex<()>,
    log_path: PathBuf,
    entry_point: EntryPoint,
    app_version: String,
    platform: &'static str,
}

impl LoggingService {
    /// Create a new logging service writing to `<data_dir>/logs.jsonl`
    pub fn new(data_dir: &Path, entry_point: EntryPoint, app_version: impl Into<String>) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;

        Ok(Self {
            lock: Mutex::new(()),
            log_path: data_dir.join(LOG_FILE),
            entry_point,
            app_version: app_version.into(),
            platform: detect_platform(),
        })
    }

    /// Log an event
    ///
    /// The entry_point, app_version, and platform are added from the service
    /// configuration.
    pub fn log(&self, event: LogEvent) -> Result<()> {
        let entry = LogEntry {
            id: generate_id(),
            timestamp: now_ms(),
            entry_point: self.entry_point.as_str().to_string(),
            app_version: self.app_version.clone(),
            platform: self.platform.to_string(),
            event: event.event,
            integration: event.integration,
            page: event.page,
            command: event.command,
            error_message: event.error_message,
            error_details: event.error_details,
        };
        let line = serde_json::to_string(&entry)?;

        let _guard = self.lock.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Log a simple event with just a name
    pub fn log_event(&self, event: &str) -> Result<()> {
        self.log(LogEvent::new(event))
    }

    /// Log a CLI command execution
    pub fn log_command(&self, command: &str) -> Result<()> {
        self.log(LogEvent::new("command_executed").with_command(command))
    }

    /// Log a frontend page navigation
    pub fn log_page(&self, page: &str) -> Result<()> {
        self.log(LogEvent::new("page_opened").with_page(page))
    }

    pub fn log_error(&self, event: &str, message: &str, details: Option<&str>) -> Result<()> {
        let mut log_event = LogEvent::new(event).with_error(message);
        if let Some(d) = details {
            log_event = log_event.with_error_details(d);
        }
        self.log(log_event)
    }

    /// Most recent entries first, up to `limit`
    pub fn get_recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let mut entries = self.read_all()?;
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        entries.truncate(limit);
        Ok(entries)
    }

    /// Most recent entries carrying an error message
    pub fn get_errors(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let mut entries: Vec<LogEntry> = self
            .read_all()?
            .into_iter()
            .filter(|e| e.error_message.is_some())
            .collect();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        entries.truncate(limit);
        Ok(entries)
    }

    pub fn count(&self) -> Result<u64> {
        Ok(self.read_all()?.len() as u64)
    }

    /// Entry counts per event and per command, plus file size and time span
    pub fn stats(&self) -> Result<LogStats> {
        let entries = self.read_all()?;
        let mut stats = LogStats {
            total: entries.len(),
            size_bytes: fs::metadata(&self.log_path).map(|m| m.len()).unwrap_or(0),
            ..LogStats::default()
        };

        for entry in &entries {
            if entry.error_message.is_some() {
                stats.errors += 1;
            }
            stats.oldest = Some(stats.oldest.map_or(entry.timestamp, |t| t.min(entry.timestamp)));
            stats.newest = Some(stats.newest.map_or(entry.timestamp, |t| t.max(entry.timestamp)));
            *stats.events.entry(entry.event.clone()).or_default() += 1;

            if let Some(command) = &entry.command {
                let counts = stats.commands.entry(command.clone()).or_default();
                match entry.event.as_str() {
                    "command_executed" => counts.runs += 1,
                    "command_failed" => counts.failures += 1,
                    _ => {}
                }
            }
        }
        Ok(stats)
    }

    /// Delete logs older than the specified timestamp (unix ms)
    pub fn delete_before(&self, timestamp_ms: i64) -> Result<u64> {
        let _guard = self.lock.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        let (kept, dropped): (Vec<_>, Vec<_>) = self
            .read_entries()?
            .into_iter()
            .partition(|e| e.timestamp >= timestamp_ms);
        self.rewrite(&kept)?;
        Ok(dropped.len() as u64)
    }

    /// Keep only the newest `keep` entries. Unparsable lines are dropped too.
    pub fn keep_latest(&self, keep: usize) -> Result<u64> {
        let _guard = self.lock.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        let mut entries = self.read_entries()?;
        entries.sort_by_key(|e| e.id);
        let dropped = entries.len().saturating_sub(keep);
        self.rewrite(&entries[dropped..])?;
        Ok(dropped as u64)
    }

    /// Copy the log file to `output_path` for troubleshooting
    pub fn export(&self, output_path: &Path) -> Result<PathBuf> {
        let _guard = self.lock.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        if self.log_path.exists() {
            fs::copy(&self.log_path, output_path)?;
        } else {
            File::create(output_path)?;
        }
        Ok(output_path.to_path_buf())
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    fn read_all(&self) -> Result<Vec<LogEntry>> {
        let _guard = self.lock.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        self.read_entries()
    }

    /// Caller holds `lock`
    fn read_entries(&self) -> Result<Vec<LogEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&self.log_path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if let Ok(entry) = serde_json::from_str::<LogEntry>(&line) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Caller holds `lock`
    fn rewrite(&self, entries: &[LogEntry]) -> Result<()> {
        let mut file = File::create(&self.log_path)?;
        for entry in entries {
            writeln!(file, "{}", serde_json::to_string(entry)?)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_log_event() {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();

        service.log_event("test_event").unwrap();

        assert!(service.log_path().exists());
        let entries = service.get_recent(10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event, "test_event");
        assert_eq!(entries[0].entry_point, "cli");
        assert_eq!(entries[0].app_version, "1.0.0");
    }

    #[test]
    fn test_log_with_context() {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Desktop, "2.0.0").unwrap();

        service
            .log(
                LogEvent::new("import_completed")
                    .with_integration("tools")
                    .with_command("import"),
            )
            .unwrap();

        let entries = service.get_recent(10).unwrap();
        assert_eq!(entries[0].integration, Some("tools".to_string()));
        assert_eq!(entries[0].command, Some("import".to_string()));
        assert_eq!(entries[0].entry_point, "desktop");
    }

    #[test]
    fn test_recent_is_newest_first() {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();
        service.log_command("status").unwrap();
        service.log_command("import").unwrap();
        service.log_page("envelopes").unwrap();

        let entries = service.get_recent(2).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].page.as_deref(), Some("envelopes"));
        assert_eq!(entries[1].command.as_deref(), Some("import"));
    }

    #[test]
    fn test_log_error() {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();

        service.log_event("ok").unwrap();
        service
            .log_error("import_failed", "Missing required mapping", Some("amount"))
            .unwrap();

        let errors = service.get_errors(10).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].event, "import_failed");
        assert_eq!(errors[0].error_details, Some("amount".to_string()));
    }

    #[test]
    fn test_count_and_delete() {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();

        service.log_event("event1").unwrap();
        service.log_event("event2").unwrap();
        service.log_event("event3").unwrap();
        assert_eq!(service.count().unwrap(), 3);

        assert_eq!(service.delete_before(0).unwrap(), 0);
        let deleted = service.delete_before(now_ms() + 1000).unwrap();
        assert_eq!(deleted, 3);
        assert_eq!(service.count().unwrap(), 0);
    }

    #[test]
    fn test_garbage_lines_skipped() {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();
        service.log_event("a").unwrap();
        let mut file = OpenOptions::new().append(true).open(service.log_path()).unwrap();
        writeln!(file, "not json").unwrap();
        service.log_event("b").unwrap();

        assert_eq!(service.count().unwrap(), 2);
    }

    #[test]
    fn test_export() {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();
        service.log_event("test_event").unwrap();

        let export_path = dir.path().join("export.jsonl");
        let result = service.export(&export_path).unwrap();
        assert!(result.exists());
        assert_eq!(
            fs::read_to_string(result).unwrap(),
            fs::read_to_string(service.log_path()).unwrap()
        );
    }

    #[test]
    fn test_stats_counts_commands_and_events() {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();

        service.log_command("import").unwrap();
        service.log_command("import").unwrap();
        service
            .log(LogEvent::new("command_failed").with_command("import").with_error("bad file"))
            .unwrap();
        service.log_command("status").unwrap();
        service.log_event("tool_called").unwrap();

        let stats = service.stats().unwrap();
        assert_eq!(stats.total, 5);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.commands["import"], CommandStats { runs: 2, failures: 1 });
        assert_eq!(stats.commands["status"], CommandStats { runs: 1, failures: 0 });
        assert_eq!(stats.events["command_executed"], 3);
        assert_eq!(stats.events["tool_called"], 1);
        assert!(stats.oldest <= stats.newest);
        assert!(stats.size_bytes > 0);
    }

    #[test]
    fn test_stats_without_file() {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();
        let stats = service.stats().unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.oldest, None);
        assert_eq!(stats.size_bytes, 0);
    }

    #[test]
    fn test_keep_latest() {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();
        for name in ["a", "b", "c", "d"] {
            service.log_event(name).unwrap();
        }

        assert_eq!(service.keep_latest(2).unwrap(), 2);
        let events: Vec<String> = service.get_recent(10).unwrap().into_iter().map(|e| e.event).collect();
        assert_eq!(events, vec!["d", "c"]);

        assert_eq!(service.keep_latest(10).unwrap(), 0);
        assert_eq!(service.count().unwrap(), 2);
    }
}
