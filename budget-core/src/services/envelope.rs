//! Envelope service - monthly budgets per category and categorization

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{CategoryType, Month};
use crate::services::LedgerService;
use crate::store::BudgetStore;

pub const NO_CURRENCY_MESSAGE: &str =
    "No currencies exist yet. Import a CSV first (or set a default currency).";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeItem {
    pub category_id: Uuid,
    pub category_name: String,
    pub budgeted: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeSummary {
    pub month: Month,
    /// Expense categories, most spent first
    pub items: Vec<EnvelopeItem>,
    /// Transactions without any split, across all months
    pub uncategorized_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBudgetResult {
    pub ok: bool,
    pub month: Month,
    pub category_id: Uuid,
    pub budgeted: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizeResult {
    pub ok: bool,
    pub transaction_id: Uuid,
    pub category_id: Uuid,
}

/// Envelope service for budgets and category assignment
pub struct EnvelopeService {
    store: Arc<BudgetStore>,
    ledger: Arc<LedgerService>,
}

impl EnvelopeService {
    pub fn new(store: Arc<BudgetStore>, ledger: Arc<LedgerService>) -> Self {
        Self { store, ledger }
    }

    /// Budgeted, spent and remaining per expense category for `month`
    pub fn summary(&self, month: Month) -> EnvelopeSummary {
        let state = self.store.get();

        let mut spent_by_category: HashMap<Uuid, Decimal> = HashMap::new();
        for split in state.splits.values() {
            let Some(tx) = state.transactions.get(&split.transaction_id) else {
                continue;
            };
            if !month.contains(tx.transaction_date) {
                continue;
            }
            let spent = if split.amount < Decimal::ZERO { split.amount.abs() } else { Decimal::ZERO };
            let total = spent_by_category.entry(split.category_id).or_default();
            *total = total.saturating_add(spent);
        }

        let start = month.start_date();
        let mut budgeted_by_category: HashMap<Uuid, Decimal> = HashMap::new();
        for budget in state.budgets.values().filter(|b| b.start_date == start) {
            let total = budgeted_by_category.entry(budget.category_id).or_default();
            *total = total.saturating_add(budget.budgeted_amount);
        }

        let mut items: Vec<EnvelopeItem> = state
            .categories
            .values()
            .filter(|c| c.category_type == CategoryType::Expense)
            .map(|c| {
                let budgeted = budgeted_by_category.get(&c.id).copied().unwrap_or_default();
                let spent = spent_by_category.get(&c.id).copied().unwrap_or_default();
                EnvelopeItem {
                    category_id: c.id,
                    category_name: c.name.clone(),
                    budgeted,
                    spent,
                    remaining: budgeted.saturating_sub(spent),
                }
            })
            .collect();
        items.sort_by(|a, b| b.spent.cmp(&a.spent));

        let categorized = state.categorized_transaction_ids();
        let uncategorized_count = state
            .transactions
            .keys()
            .filter(|id| !categorized.contains(id))
            .count();

        EnvelopeSummary {
            month,
            items,
            uncategorized_count,
        }
    }

    /// Set the budget for a category in a month. Negative amounts become 0.
    pub fn set_budget(&self, month: Month, category_name: &str, amount: Decimal) -> Result<SetBudgetResult> {
        let category_name = category_name.trim();
        if category_name.is_empty() {
            anyhow::bail!("Category name cannot be empty");
        }

        let currency_id = match self.store.get().budget_currency() {
            Some(currency) => currency.id,
            None => anyhow::bail!(NO_CURRENCY_MESSAGE),
        };

        let category = self
            .ledger
            .get_or_create_category(category_name, CategoryType::Expense)?;
        let amount = amount.max(Decimal::ZERO);
        let row = self.ledger.upsert_budget(&category, month, amount, currency_id)?;

        Ok(SetBudgetResult {
            ok: true,
            month,
            category_id: category.id,
            budgeted: row.budgeted_amount,
        })
    }

    /// Assign a transaction wholly to the named category
    pub fn categorize_transaction(&self, transaction_id: Uuid, category_name: &str) -> Result<CategorizeResult> {
        let category_name = category_name.trim();
        if category_name.is_empty() {
            anyhow::bail!("Category name cannot be empty");
        }

        let tx = match self.store.get().transactions.get(&transaction_id) {
            Some(tx) => tx.clone(),
            None => anyhow::bail!("Transaction not found"),
        };

        let category = self
            .ledger
            .get_or_create_category(category_name, CategoryType::for_amount(tx.amount))?;
        self.ledger.categorize(tx.id, category.id, tx.amount)?;

        Ok(CategorizeResult {
            ok: true,
            transaction_id: tx.id,
            category_id: category.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStorage;
    use crate::domain::Transaction;
    use crate::store::STATE_KEY;
    use chrono::NaiveDate;

    fn services() -> (Arc<LedgerService>, EnvelopeService) {
        let store = Arc::new(BudgetStore::open(Arc::new(MemoryStorage::new()), STATE_KEY).unwrap());
        let ledger = Arc::new(LedgerService::new(Arc::clone(&store)));
        (Arc::clone(&ledger), EnvelopeService::new(store, ledger))
    }

    fn add_tx(ledger: &LedgerService, date: (i32, u32, u32), cents: i64) -> Transaction {
        let usd = ledger.get_or_create_currency("USD").unwrap();
        let account = ledger.get_or_create_account("Checking", usd.id).unwrap();
        ledger
            .insert_transaction(Transaction::new(
                Uuid::new_v4(),
                account.id,
                Decimal::new(cents, 2),
                NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
                usd.id,
            ))
            .unwrap()
    }

    #[test]
    fn test_set_budget_requires_currency() {
        let (_ledger, envelopes) = services();
        let err = envelopes
            .set_budget("2024-05".parse().unwrap(), "Food", Decimal::new(100, 0))
            .unwrap_err();
        assert_eq!(err.to_string(), NO_CURRENCY_MESSAGE);
    }

    #[test]
    fn test_set_budget_clamps_and_upserts() {
        let (ledger, envelopes) = services();
        ledger.get_or_create_currency("USD").unwrap();
        let month: Month = "2024-05".parse().unwrap();

        let result = envelopes.set_budget(month, "Food", Decimal::new(-50, 0)).unwrap();
        assert_eq!(result.budgeted, Decimal::ZERO);
        envelopes.set_budget(month, "food", Decimal::new(250, 0)).unwrap();

        let summary = envelopes.summary(month);
        assert_eq!(summary.items.len(), 1);
        assert_eq!(summary.items[0].budgeted, Decimal::new(250, 0));
        assert_eq!(summary.items[0].remaining, Decimal::new(250, 0));
    }

    #[test]
    fn test_summary_spent_and_order() {
        let (ledger, envelopes) = services();
        let month: Month = "2024-05".parse().unwrap();

        let coffee = add_tx(&ledger, (2024, 5, 2), -450);
        let rent = add_tx(&ledger, (2024, 5, 1), -120000);
        let april = add_tx(&ledger, (2024, 4, 30), -9900);
        add_tx(&ledger, (2024, 5, 3), -100);

        envelopes.categorize_transaction(coffee.id, "Coffee").unwrap();
        envelopes.categorize_transaction(rent.id, "Rent").unwrap();
        envelopes.categorize_transaction(april.id, "Coffee").unwrap();
        envelopes.set_budget(month, "Rent", Decimal::new(1000, 0)).unwrap();

        let summary = envelopes.summary(month);
        let names: Vec<&str> = summary.items.iter().map(|i| i.category_name.as_str()).collect();
        assert_eq!(names, vec!["Rent", "Coffee"]);
        assert_eq!(summary.items[0].spent, Decimal::new(120000, 2));
        assert_eq!(summary.items[0].remaining, Decimal::new(-20000, 2));
        assert_eq!(summary.items[1].spent, Decimal::new(450, 2));
        assert_eq!(summary.uncategorized_count, 1);
    }

    #[test]
    fn test_income_categories_are_not_envelopes() {
        let (ledger, envelopes) = services();
        let pay = add_tx(&ledger, (2024, 5, 15), 300000);
        let result = envelopes.categorize_transaction(pay.id, "Salary").unwrap();

        let state = ledger.state();
        assert_eq!(state.categories[&result.category_id].category_type, CategoryType::Income);
        assert!(envelopes.summary("2024-05".parse().unwrap()).items.is_empty());
    }

    #[test]
    fn test_categorize_unknown_transaction() {
        let (_ledger, envelopes) = services();
        let err = envelopes.categorize_transaction(Uuid::new_v4(), "Food").unwrap_err();
        assert_eq!(err.to_string(), "Transaction not found");
    }
}
