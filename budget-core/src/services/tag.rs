//! Tag service - transaction tagging

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::Tag;
use crate::services::LedgerService;
use crate::store::BudgetStore;

/// Tag service for transaction tagging
pub struct TagService {
    store: Arc<BudgetStore>,
    ledger: Arc<LedgerService>,
}

impl TagService {
    pub fn new(store: Arc<BudgetStore>, ledger: Arc<LedgerService>) -> Self {
        Self { store, ledger }
    }

    /// Apply tags to transactions
    ///
    /// Each transaction succeeds or fails on its own. With `replace` the
    /// existing tags are dropped first; otherwise tags are merged.
    pub fn apply_tags(&self, tx_ids: &[String], tags: &[String], replace: bool) -> Result<TagResult> {
        let mut results = Vec::new();
        let mut succeeded = 0i64;
        let mut failed = 0i64;

        for tx_id in tx_ids {
            match self.apply_tags_to_transaction(tx_id, tags, replace) {
                Ok(applied_tags) => {
                    succeeded += 1;
                    results.push(TagResultEntry {
                        transaction_id: tx_id.clone(),
                        tags: Some(applied_tags),
                        success: true,
                        error: None,
                    });
                }
                Err(e) => {
                    failed += 1;
                    results.push(TagResultEntry {
                        transaction_id: tx_id.clone(),
                        tags: None,
                        success: false,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Ok(TagResult {
            succeeded,
            failed,
            results,
        })
    }

    /// Tag names of a transaction, sorted
    pub fn tags_for(&self, tx_id: Uuid) -> Vec<String> {
        let mut names: Vec<String> = self
            .store
            .get()
            .tags_for(tx_id)
            .into_iter()
            .map(|t| t.name.clone())
            .collect();
        names.sort();
        names
    }

    fn apply_tags_to_transaction(&self, tx_id: &str, new_tags: &[String], replace: bool) -> Result<Vec<String>> {
        let tx_id = match Uuid::parse_str(tx_id.trim()) {
            Ok(id) => id,
            Err(_) => anyhow::bail!("Invalid UUID: {}", tx_id),
        };
        if !self.store.get().transactions.contains_key(&tx_id) {
            anyhow::bail!("Transaction not found");
        }

        if replace {
            self.ledger.clear_tags(tx_id)?;
        }

        for name in new_tags.iter().flat_map(|t| Tag::split_names(t)) {
            let tag = self.ledger.get_or_create_tag(&name)?;
            self.ledger.link_tag(tx_id, tag.id)?;
        }

        Ok(self.tags_for(tx_id))
    }
}

/// Outcome of a tagging run
#[derive(Debug, Serialize)]
pub struct TagResult {
    pub succeeded: i64,
    pub failed: i64,
    pub results: Vec<TagResultEntry>,
}

/// Individual transaction result entry
#[derive(Debug, Serialize)]
pub struct TagResultEntry {
    pub transaction_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
