//! Status service - account and transaction summaries

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::store::BudgetStore;

/// Status service for account summaries
pub struct StatusService {
    store: Arc<BudgetStore>,
}

impl StatusService {
    pub fn new(store: Arc<BudgetStore>) -> Self {
        Self { store }
    }

    /// Get overall status summary
    pub fn get_status(&self) -> StatusSummary {
        let state = self.store.get();
        let dates = || state.transactions.values().map(|t| t.transaction_date);

        let mut accounts: Vec<AccountSummary> = state
            .accounts
            .values()
            .map(|a| AccountSummary {
                id: a.id.to_string(),
                name: a.name.clone(),
                account_type: a.account_type.clone(),
                currency_code: state.currencies.get(&a.currency_id).map(|c| c.code.clone()),
                transaction_count: state.transactions.values().filter(|t| t.account_id == a.id).count(),
            })
            .collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));

        StatusSummary {
            total_accounts: state.accounts.len(),
            total_transactions: state.transactions.len(),
            total_categories: state.categories.len(),
            total_tags: state.tags.len(),
            total_budgets: state.budgets.len(),
            total_import_jobs: state.import_jobs.len(),
            default_currency_code: state.settings.default_currency_code.clone(),
            accounts,
            date_range: DateRange {
                earliest: dates().min(),
                latest: dates().max(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub total_accounts: usize,
    pub total_transactions: usize,
    pub total_categories: usize,
    pub total_tags: usize,
    pub total_budgets: usize,
    pub total_import_jobs: usize,
    pub default_currency_code: String,
    pub accounts: Vec<AccountSummary>,
    pub date_range: DateRange,
}

#[derive(Debug, Serialize)]
pub struct AccountSummary {
    pub id: String,
    pub name: String,
    pub account_type: String,
    pub currency_code: Option<String>,
    pub transaction_count: usize,
}

#[derive(Debug, Serialize)]
pub struct DateRange {
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
}
