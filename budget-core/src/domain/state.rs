//! The budget state document
//!
//! Everything the application knows lives in one `BudgetState`, persisted as a
//! single JSON document under one storage key:
//! ```json
//! { "version": 1, "settings": { "defaultCurrencyCode": "USD", ... },
//!   "currencies": { "<id>": { ... } }, ..., "importKeys": { "imp_1a2b": "<tx id>" } }
//! ```
//! Documents with a missing or different `version` are discarded on load.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    Account, BudgetRow, Category, Currency, ImportJob, ImportJobError, ImportJobMapping, Merchant,
    Tag, Transaction, TransactionSplit, TransactionTag,
};

/// Current document version. There is no migration path between versions.
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSettings {
    pub default_currency_code: String,
    pub default_account_type: String,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            default_currency_code: "USD".to_string(),
            default_account_type: "checking".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetState {
    pub version: u32,
    pub settings: BudgetSettings,
    #[serde(default)]
    pub currencies: BTreeMap<Uuid, Currency>,
    #[serde(default)]
    pub accounts: BTreeMap<Uuid, Account>,
    #[serde(default)]
    pub merchants: BTreeMap<Uuid, Merchant>,
    #[serde(default)]
    pub categories: BTreeMap<Uuid, Category>,
    #[serde(default)]
    pub transactions: BTreeMap<Uuid, Transaction>,
    #[serde(default)]
    pub splits: BTreeMap<Uuid, TransactionSplit>,
    #[serde(default)]
    pub tags: BTreeMap<Uuid, Tag>,
    /// key: `transactionId:tagId`
    #[serde(default)]
    pub transaction_tags: BTreeMap<String, TransactionTag>,
    #[serde(default)]
    pub budgets: BTreeMap<Uuid, BudgetRow>,
    #[serde(default)]
    pub import_jobs: BTreeMap<Uuid, ImportJob>,
    #[serde(default)]
    pub import_job_mappings: BTreeMap<Uuid, ImportJobMapping>,
    #[serde(default)]
    pub import_job_errors: BTreeMap<Uuid, ImportJobError>,
    /// import key -> transaction id
    #[serde(default)]
    pub import_keys: BTreeMap<String, Uuid>,
}

impl Default for BudgetState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            settings: BudgetSettings::default(),
            currencies: BTreeMap::new(),
            accounts: BTreeMap::new(),
            merchants: BTreeMap::new(),
            categories: BTreeMap::new(),
            transactions: BTreeMap::new(),
            splits: BTreeMap::new(),
            tags: BTreeMap::new(),
            transaction_tags: BTreeMap::new(),
            budgets: BTreeMap::new(),
            import_jobs: BTreeMap::new(),
            import_job_mappings: BTreeMap::new(),
            import_job_errors: BTreeMap::new(),
            import_keys: BTreeMap::new(),
        }
    }
}

impl BudgetState {
    /// Decode a persisted document. Unreadable or version-mismatched input
    /// yields `None`; callers fall back to the default state.
    pub fn from_document(raw: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(raw).ok()?;
        if value.get("version").and_then(|v| v.as_u64()) != Some(STATE_VERSION as u64) {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    pub fn to_document(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn find_currency_by_code(&self, code: &str) -> Option<&Currency> {
        let code = Currency::normalize_code(code);
        self.currencies.values().find(|c| c.code == code)
    }

    pub fn find_account_by_name(&self, name: &str) -> Option<&Account> {
        self.accounts.values().find(|a| a.has_name(name))
    }

    pub fn find_merchant_by_name(&self, name: &str) -> Option<&Merchant> {
        self.merchants.values().find(|m| m.has_name(name))
    }

    pub fn find_category_by_name(&self, name: &str) -> Option<&Category> {
        self.categories.values().find(|c| c.has_name(name))
    }

    pub fn find_tag_by_name(&self, name: &str) -> Option<&Tag> {
        self.tags.values().find(|t| t.has_name(name))
    }

    /// Transaction already registered under an import key, if it still exists
    pub fn transaction_for_import_key(&self, import_key: &str) -> Option<&Transaction> {
        self.import_keys
            .get(import_key)
            .and_then(|id| self.transactions.get(id))
    }

    pub fn splits_for(&self, transaction_id: Uuid) -> Vec<&TransactionSplit> {
        self.splits
            .values()
            .filter(|s| s.transaction_id == transaction_id)
            .collect()
    }

    /// Ids of transactions that have at least one split
    pub fn categorized_transaction_ids(&self) -> HashSet<Uuid> {
        self.splits.values().map(|s| s.transaction_id).collect()
    }

    pub fn tags_for(&self, transaction_id: Uuid) -> Vec<&Tag> {
        self.transaction_tags
            .values()
            .filter(|link| link.transaction_id == transaction_id)
            .filter_map(|link| self.tags.get(&link.tag_id))
            .collect()
    }

    /// Currency used for budgets: the default code, else the first by code
    pub fn budget_currency(&self) -> Option<&Currency> {
        self.find_currency_by_code(&self.settings.default_currency_code)
            .or_else(|| self.currencies.values().min_by(|a, b| a.code.cmp(&b.code)))
    }
}
