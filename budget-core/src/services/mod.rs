//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and the state store. Each service
//! focuses on a specific use case or feature area.

mod demo;
mod envelope;
pub mod import;
mod insights;
mod ledger;
pub mod logging;
mod status;
mod tag;
pub mod tools;
pub mod upload;

pub use demo::DemoService;
pub use envelope::{CategorizeResult, EnvelopeItem, EnvelopeService, EnvelopeSummary, SetBudgetResult};
pub use import::{
    CommitOptions, CsvField, CsvMapping, ImportCommitResult, ImportPreview, ImportRowError, ImportService,
};
pub use insights::InsightsService;
pub use ledger::LedgerService;
pub use logging::{CommandStats, EntryPoint, LogEntry, LogEvent, LogStats, LoggingService};
pub use status::{AccountSummary, DateRange, StatusService, StatusSummary};
pub use tag::{TagResult, TagResultEntry, TagService};
pub use tools::{ToolService, TOOL_NAMES};
pub use upload::{CsvUpload, UploadInfo, UploadService};
