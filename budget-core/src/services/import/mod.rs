//! Import service - CSV preview and commit
//!
//! A commit walks the data rows in file order. Each row is normalized,
//! deduplicated by import key and written through the ledger. Bad rows are
//! recorded against the import job and skipped; the batch always runs to
//! the end.

pub mod csv;
pub mod mapping;
pub mod normalize;

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{Config, ImportProfile};
use crate::domain::{
    build_import_key, BudgetState, CategoryType, ImportJob, ImportJobError, ImportJobMapping,
    ImportJobStatus, MappingType, Tag, Transaction,
};
use crate::services::LedgerService;
use crate::store::BudgetStore;

pub use self::csv::{parse_csv, ParsedCsv};
pub use self::mapping::{normalize_header_name, suggest_mapping, CsvField, CsvMapping};
pub use self::normalize::{parse_amount, parse_date};

/// Filename recorded when the caller gives none
pub const DEFAULT_UPLOAD_FILENAME: &str = "import.csv";

/// Rows included in a preview
pub const PREVIEW_SAMPLE_ROWS: usize = 10;

/// Options for a commit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitOptions {
    #[serde(default)]
    pub filename: Option<String>,
    /// Currency for rows without a currency value
    #[serde(default)]
    pub default_currency_code: Option<String>,
}

/// What a CSV looks like before committing it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub headers: Vec<String>,
    /// First rows keyed by header, values trimmed
    pub sample_rows: Vec<BTreeMap<String, String>>,
    pub suggested_mapping: CsvMapping,
    pub row_count: usize,
}

/// Entities created by a commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedCounts {
    pub accounts: usize,
    pub merchants: usize,
    pub categories: usize,
    pub transactions: usize,
    pub tags: usize,
}

impl CreatedCounts {
    fn of(state: &BudgetState) -> Self {
        Self {
            accounts: state.accounts.len(),
            merchants: state.merchants.len(),
            categories: state.categories.len(),
            transactions: state.transactions.len(),
            tags: state.tags.len(),
        }
    }

    fn delta(before: Self, after: Self) -> Self {
        Self {
            accounts: after.accounts.saturating_sub(before.accounts),
            merchants: after.merchants.saturating_sub(before.merchants),
            categories: after.categories.saturating_sub(before.categories),
            transactions: after.transactions.saturating_sub(before.transactions),
            tags: after.tags.saturating_sub(before.tags),
        }
    }
}

/// A row that could not be imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRowError {
    /// 1-based line number counting the header as row 1; 0 for batch errors
    pub row_number: usize,
    pub message: String,
    #[serde(default)]
    pub raw: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCommitResult {
    pub import_job_id: Uuid,
    pub total_rows: usize,
    pub success_rows: usize,
    pub failed_rows: usize,
    pub created: CreatedCounts,
    pub errors: Vec<ImportRowError>,
}

/// Import service for CSV imports
pub struct ImportService {
    store: Arc<BudgetStore>,
    ledger: Arc<LedgerService>,
    data_dir: PathBuf,
}

impl ImportService {
    pub fn new(store: Arc<BudgetStore>, ledger: Arc<LedgerService>, data_dir: PathBuf) -> Self {
        Self { store, ledger, data_dir }
    }

    /// Tokenize the CSV and suggest a mapping. Writes nothing.
    pub fn preview(&self, csv_text: &str) -> Result<ImportPreview> {
        let parsed = parse_csv(csv_text);

        let sample_rows = parsed
            .rows
            .iter()
            .take(PREVIEW_SAMPLE_ROWS)
            .map(|row| {
                parsed
                    .row_map(row)
                    .into_iter()
                    .map(|(h, v)| (h.to_string(), v.to_string()))
                    .collect()
            })
            .collect();

        Ok(ImportPreview {
            suggested_mapping: suggest_mapping(&parsed.headers),
            row_count: parsed.rows.len(),
            headers: parsed.headers,
            sample_rows,
        })
    }

    /// Import every row of the CSV using `mapping`.
    ///
    /// Row failures are reported in the result and never abort the batch.
    /// Re-committing the same data creates nothing new.
    pub fn commit(
        &self,
        csv_text: &str,
        mapping: &CsvMapping,
        options: &CommitOptions,
    ) -> Result<ImportCommitResult> {
        let parsed = parse_csv(csv_text);
        let total_rows = parsed.rows.len();
        let before = CreatedCounts::of(&self.store.get());

        let job_id = Uuid::new_v4();
        let filename = options
            .filename
            .clone()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_UPLOAD_FILENAME.to_string());

        let batch = self.store.defer_writes();

        if let Some(field) = mapping.missing_required() {
            let message = format!("Missing required mapping for: {}", field);
            self.record_failed_job(job_id, &filename, total_rows, &message)?;
            batch.commit().context("Failed to save import job")?;
            return Ok(ImportCommitResult {
                import_job_id: job_id,
                total_rows,
                success_rows: 0,
                failed_rows: total_rows,
                created: CreatedCounts::default(),
                errors: vec![ImportRowError {
                    row_number: 0,
                    message,
                    raw: Vec::new(),
                }],
            });
        }

        self.start_job(job_id, &filename, total_rows, mapping)?;

        let default_currency = self.default_currency(options);
        let mut errors = Vec::new();
        let mut success_rows = 0;

        for (idx, row) in parsed.rows.iter().enumerate() {
            let row_number = idx + 2;
            let values = parsed.row_map(row);

            match self.import_row(&values, mapping, &default_currency)? {
                Ok(()) => success_rows += 1,
                Err(message) => {
                    self.record_row_error(job_id, row_number, &message, row)?;
                    errors.push(ImportRowError {
                        row_number,
                        message,
                        raw: row.clone(),
                    });
                }
            }
        }

        let failed_rows = errors.len();
        self.store.update(|state| {
            if let Some(job) = state.import_jobs.get_mut(&job_id) {
                job.status = ImportJobStatus::Completed;
                job.finished_at = Some(Utc::now());
                job.processed_rows = total_rows;
                job.success_rows = success_rows;
                job.failed_rows = failed_rows;
                job.error_summary = (failed_rows > 0).then(|| format!("{} rows failed", failed_rows));
            }
        })?;

        batch.commit().context("Failed to save imported data")?;

        let after = CreatedCounts::of(&self.store.get());
        Ok(ImportCommitResult {
            import_job_id: job_id,
            total_rows,
            success_rows,
            failed_rows,
            created: CreatedCounts::delta(before, after),
            errors,
        })
    }

    /// Process one row. The inner error is a row-local failure message;
    /// the outer error is a storage failure that aborts the commit.
    fn import_row(
        &self,
        values: &[(&str, &str)],
        mapping: &CsvMapping,
        default_currency: &str,
    ) -> Result<std::result::Result<(), String>> {
        let field = |f: CsvField| field_value(values, mapping, f);

        let date_raw = field(CsvField::Date);
        let account_raw = field(CsvField::Account);
        let amount_raw = field(CsvField::Amount);

        let Some(date) = parse_date(date_raw) else {
            return Ok(Err(format!("Invalid date: \"{}\"", date_raw)));
        };
        if account_raw.is_empty() {
            return Ok(Err("Missing account".to_string()));
        }
        let Some(amount) = parse_amount(amount_raw) else {
            return Ok(Err(format!("Invalid amount: \"{}\"", amount_raw)));
        };

        let currency_raw = field(CsvField::Currency);
        let currency_code = if currency_raw.is_empty() { default_currency } else { currency_raw };
        let currency = self.ledger.get_or_create_currency(currency_code)?;

        let account = self.ledger.get_or_create_account(account_raw, currency.id)?;

        let merchant_raw = field(CsvField::Merchant);
        let merchant = if merchant_raw.is_empty() {
            None
        } else {
            Some(self.ledger.get_or_create_merchant(merchant_raw)?)
        };

        let description = non_empty(field(CsvField::Description));
        let notes = non_empty(field(CsvField::Notes));

        let import_key = build_import_key(
            date,
            &account.name,
            amount,
            description.as_deref(),
            merchant.as_ref().map(|m| m.name.as_str()),
        );

        if self.store.get().transaction_for_import_key(&import_key).is_some() {
            return Ok(Ok(()));
        }

        let mut tx = Transaction::new(Uuid::new_v4(), account.id, amount, date, currency.id);
        tx.description = description;
        tx.merchant_id = merchant.map(|m| m.id);
        tx.notes = notes;
        tx.import_key = Some(import_key);
        let tx = self.ledger.insert_transaction(tx)?;

        let category_raw = field(CsvField::Category);
        if !category_raw.is_empty() {
            let category = self
                .ledger
                .get_or_create_category(category_raw, CategoryType::for_amount(amount))?;
            self.ledger.categorize(tx.id, category.id, amount)?;
        }

        let tags_raw = field(CsvField::Tags);
        for name in Tag::split_names(tags_raw) {
            let tag = self.ledger.get_or_create_tag(&name)?;
            self.ledger.link_tag(tx.id, tag.id)?;
        }

        Ok(Ok(()))
    }

    fn default_currency(&self, options: &CommitOptions) -> String {
        options
            .default_currency_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .or_else(|| {
                let code = self.store.get().settings.default_currency_code.clone();
                (!code.trim().is_empty()).then_some(code)
            })
            .unwrap_or_else(|| "USD".to_string())
    }

    fn start_job(&self, job_id: Uuid, filename: &str, total_rows: usize, mapping: &CsvMapping) -> Result<()> {
        let job = ImportJob::running(job_id, filename, total_rows);
        let mappings: Vec<ImportJobMapping> = mapping
            .entries()
            .into_iter()
            .map(|(field, header)| ImportJobMapping {
                id: Uuid::new_v4(),
                import_job_id: job_id,
                csv_column_name: header.to_string(),
                target_field_name: field.to_string(),
                mapping_type: MappingType::Column,
                fixed_value: None,
            })
            .collect();

        self.store.update(|state| {
            state.import_jobs.insert(job.id, job);
            for m in mappings {
                state.import_job_mappings.insert(m.id, m);
            }
        })?;
        Ok(())
    }

    fn record_failed_job(&self, job_id: Uuid, filename: &str, total_rows: usize, message: &str) -> Result<()> {
        let mut job = ImportJob::running(job_id, filename, total_rows);
        job.status = ImportJobStatus::Failed;
        job.finished_at = Some(Utc::now());
        job.failed_rows = total_rows;
        job.error_summary = Some(message.to_string());

        self.store.update(|state| {
            state.import_jobs.insert(job.id, job);
        })?;
        Ok(())
    }

    fn record_row_error(&self, job_id: Uuid, row_number: usize, message: &str, raw: &[String]) -> Result<()> {
        let error = ImportJobError {
            id: Uuid::new_v4(),
            import_job_id: job_id,
            row_number,
            error_message: message.to_string(),
            raw_data: serde_json::to_string(raw).ok(),
        };
        self.store.update(|state| {
            state.import_job_errors.insert(error.id, error);
        })?;
        Ok(())
    }

    /// Import jobs, newest first
    pub fn list_jobs(&self) -> Vec<ImportJob> {
        let mut jobs: Vec<ImportJob> = self.store.get().import_jobs.values().cloned().collect();
        jobs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        jobs
    }

    /// Row errors recorded for one job, in row order
    pub fn job_errors(&self, job_id: Uuid) -> Vec<ImportJobError> {
        let mut errors: Vec<ImportJobError> = self
            .store
            .get()
            .import_job_errors
            .values()
            .filter(|e| e.import_job_id == job_id)
            .cloned()
            .collect();
        errors.sort_by_key(|e| e.row_number);
        errors
    }

    /// List saved import profiles
    pub fn list_profiles(&self) -> Result<HashMap<String, ImportProfile>> {
        let config = Config::load(&self.data_dir)?;
        Ok(config.import_profiles)
    }

    /// Get a saved profile
    pub fn get_profile(&self, name: &str) -> Result<Option<ImportProfile>> {
        let config = Config::load(&self.data_dir)?;
        Ok(config.import_profiles.get(name).cloned())
    }

    /// Save a mapping under `name`, replacing any profile with that name
    pub fn save_profile(&self, name: &str, mapping: &CsvMapping, default_currency_code: Option<&str>) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("Profile name cannot be empty");
        }
        let mut config = Config::load(&self.data_dir)?;
        config.import_profiles.insert(
            name.to_string(),
            ImportProfile {
                mapping: mapping.clone(),
                default_currency_code: default_currency_code.map(|c| c.trim().to_uppercase()),
            },
        );
        config.save(&self.data_dir)?;
        Ok(())
    }

    /// Delete a profile. Returns false if it did not exist.
    pub fn delete_profile(&self, name: &str) -> Result<bool> {
        let mut config = Config::load(&self.data_dir)?;
        let removed = config.import_profiles.remove(name).is_some();
        if removed {
            config.save(&self.data_dir)?;
        }
        Ok(removed)
    }
}

/// Trimmed value of the column mapped to `field`; empty when unmapped.
/// When two headers share a name the later column wins.
fn field_value<'a>(values: &[(&'a str, &'a str)], mapping: &CsvMapping, field: CsvField) -> &'a str {
    let Some(header) = mapping.get(field) else {
        return "";
    };
    values
        .iter()
        .rev()
        .find(|(h, _)| *h == header)
        .map(|(_, v)| *v)
        .unwrap_or("")
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
