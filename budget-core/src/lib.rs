//! budget-analyzer core - local-first envelope budgeting
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core entities (Account, Transaction, BudgetRow, etc.) and the state document
//! - **ports**: Trait definitions for external dependencies (KeyValueStorage)
//! - **store**: The observable state store every mutation goes through
//! - **services**: Business logic orchestration (CSV import, envelopes, insights)
//! - **adapters**: Concrete implementations (filesystem and in-memory storage, demo data)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;
pub mod store;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::FileStorage;
use config::Config;
use ports::KeyValueStorage;
use services::*;
use store::{BudgetStore, DEMO_STATE_KEY, STATE_KEY};

// Re-export commonly used types at crate root
pub use domain::{Account, BudgetRow, BudgetState, Category, Month, Transaction, TransactionSplit};
pub use domain::result::{Error, OperationResult};
pub use services::{EntryPoint, LogEvent, LoggingService};

/// Directory under the data dir holding the key-value documents
pub const STORAGE_DIR: &str = "storage";

/// Main context for budget-analyzer operations
///
/// This is the primary entry point for all business logic. It holds the
/// state store, configuration, and all services.
pub struct BudgetContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub storage: Arc<dyn KeyValueStorage>,
    pub store: Arc<BudgetStore>,
    pub ledger: Arc<LedgerService>,
    pub import_service: Arc<ImportService>,
    pub envelope_service: Arc<EnvelopeService>,
    pub insights_service: Arc<InsightsService>,
    pub tag_service: TagService,
    pub upload_service: UploadService,
    pub status_service: StatusService,
    pub demo_service: DemoService,
    pub tool_service: ToolService,
}

impl BudgetContext {
    /// Open the context rooted at `data_dir`, creating it if needed
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;
        let storage: Arc<dyn KeyValueStorage> = Arc::new(
            FileStorage::new(&data_dir.join(STORAGE_DIR))
                .with_context(|| format!("Failed to open storage in {}", data_dir.display()))?,
        );
        Self::with_storage(data_dir, config, storage)
    }

    /// Build a context over any storage backend
    pub fn with_storage(data_dir: &Path, config: Config, storage: Arc<dyn KeyValueStorage>) -> Result<Self> {
        // Demo mode works on its own state document
        let state_key = if config.demo_mode { DEMO_STATE_KEY } else { STATE_KEY };
        let store = Arc::new(BudgetStore::open(Arc::clone(&storage), state_key)?);

        let ledger = Arc::new(LedgerService::new(Arc::clone(&store)));
        let import_service = Arc::new(ImportService::new(
            Arc::clone(&store),
            Arc::clone(&ledger),
            data_dir.to_path_buf(),
        ));
        let envelope_service = Arc::new(EnvelopeService::new(Arc::clone(&store), Arc::clone(&ledger)));
        let insights_service = Arc::new(InsightsService::new(Arc::clone(&store)));
        let tag_service = TagService::new(Arc::clone(&store), Arc::clone(&ledger));
        let upload_service = UploadService::new(Arc::clone(&storage));
        let status_service = StatusService::new(Arc::clone(&store));
        let demo_service = DemoService::new(data_dir, Arc::clone(&storage));
        let tool_service = ToolService::new(
            Arc::clone(&store),
            Arc::clone(&import_service),
            Arc::clone(&envelope_service),
            Arc::clone(&insights_service),
        );

        Ok(Self {
            config,
            data_dir: data_dir.to_path_buf(),
            storage,
            store,
            ledger,
            import_service,
            envelope_service,
            insights_service,
            tag_service,
            upload_service,
            status_service,
            demo_service,
            tool_service,
        })
    }
}
