//! Demo service - manage demo mode
//!
//! Demo mode keeps its state under a separate storage key, seeded from a
//! generated bank export, so real data is never touched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

use crate::adapters::demo::{demo_budgets, generate_demo_csv};
use crate::config::Config;
use crate::domain::Month;
use crate::ports::KeyValueStorage;
use crate::services::import::{suggest_mapping, CommitOptions, ImportCommitResult, ImportService};
use crate::services::{EnvelopeService, LedgerService};
use crate::store::{BudgetStore, DEMO_STATE_KEY};

/// Filename recorded on the demo import job
pub const DEMO_FILENAME: &str = "demo.csv";

/// Demo service for managing demo mode
pub struct DemoService {
    data_dir: PathBuf,
    storage: Arc<dyn KeyValueStorage>,
}

impl DemoService {
    pub fn new(data_dir: &Path, storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            storage,
        }
    }

    /// Check if demo mode is currently enabled
    pub fn is_enabled(&self) -> Result<bool> {
        let config = Config::load(&self.data_dir)?;
        Ok(config.demo_mode)
    }

    /// Enable demo mode
    ///
    /// This will:
    /// 1. Delete any existing demo state (fresh start)
    /// 2. Enable demo mode in config
    /// 3. Import the sample export and set this month's envelopes
    pub fn enable(&self) -> Result<ImportCommitResult> {
        self.storage
            .remove(DEMO_STATE_KEY)
            .context("Failed to clear demo state")?;

        let mut config = Config::load(&self.data_dir).unwrap_or_default();
        config.enable_demo_mode();
        config.save(&self.data_dir)?;

        self.seed(Local::now().date_naive())
    }

    /// Disable demo mode
    ///
    /// This will:
    /// 1. Disable demo mode in config
    /// 2. Optionally delete the demo state (if clean = true)
    pub fn disable(&self, clean: bool) -> Result<()> {
        let mut config = Config::load(&self.data_dir).unwrap_or_default();
        config.disable_demo_mode();
        config.save(&self.data_dir)?;

        if clean {
            self.storage
                .remove(DEMO_STATE_KEY)
                .context("Failed to clear demo state")?;
        }

        Ok(())
    }

    /// Fill the demo state with data ending on `today`
    fn seed(&self, today: NaiveDate) -> Result<ImportCommitResult> {
        let store = Arc::new(BudgetStore::open(Arc::clone(&self.storage), DEMO_STATE_KEY)?);
        let ledger = Arc::new(LedgerService::new(Arc::clone(&store)));
        let import = ImportService::new(Arc::clone(&store), Arc::clone(&ledger), self.data_dir.clone());
        let envelopes = EnvelopeService::new(Arc::clone(&store), ledger);

        let currency_code = store.get().settings.default_currency_code.clone();
        let csv_text = generate_demo_csv(today, &currency_code)?;
        let preview = import.preview(&csv_text)?;
        let result = import.commit(
            &csv_text,
            &preview.suggested_mapping,
            &CommitOptions {
                filename: Some(DEMO_FILENAME.to_string()),
                default_currency_code: Some(currency_code),
            },
        )?;

        let month = Month::of(today);
        for (category, amount) in demo_budgets() {
            envelopes.set_budget(month, category, amount)?;
        }

        Ok(result)
    }
}
