//! Ledger service - reference entity upserts and transaction writes
//!
//! Reference entities (currencies, accounts, merchants, categories, tags)
//! are get-or-create by case-insensitive name and are never deleted.

use std::sync::Arc;

use anyhow::Result;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{
    Account, BudgetRow, BudgetState, Category, CategoryType, Currency, Merchant, Month, Tag,
    Transaction, TransactionSplit, TransactionTag,
};
use crate::store::BudgetStore;

/// Ledger service shared by import, envelope and tagging flows
pub struct LedgerService {
    store: Arc<BudgetStore>,
}

impl LedgerService {
    pub fn new(store: Arc<BudgetStore>) -> Self {
        Self { store }
    }

    pub fn state(&self) -> Arc<BudgetState> {
        self.store.get()
    }

    /// Currency with `code` (uppercased), created if missing
    pub fn get_or_create_currency(&self, code: &str) -> Result<Currency> {
        let code = Currency::normalize_code(code);
        if let Some(existing) = self.store.get().find_currency_by_code(&code) {
            return Ok(existing.clone());
        }
        let currency = self.store.update(|state| {
            if let Some(existing) = state.find_currency_by_code(&code) {
                return existing.clone();
            }
            let currency = Currency::new(Uuid::new_v4(), &code);
            state.currencies.insert(currency.id, currency.clone());
            currency
        })?;
        Ok(currency)
    }

    /// Account named `name`; a new one takes the settings' default account type
    pub fn get_or_create_account(&self, name: &str, currency_id: Uuid) -> Result<Account> {
        if let Some(existing) = self.store.get().find_account_by_name(name) {
            return Ok(existing.clone());
        }
        let account = self.store.update(|state| {
            if let Some(existing) = state.find_account_by_name(name) {
                return existing.clone();
            }
            let account = Account::new(
                Uuid::new_v4(),
                name,
                state.settings.default_account_type.clone(),
                currency_id,
            );
            state.accounts.insert(account.id, account.clone());
            account
        })?;
        Ok(account)
    }

    pub fn get_or_create_merchant(&self, name: &str) -> Result<Merchant> {
        if let Some(existing) = self.store.get().find_merchant_by_name(name) {
            return Ok(existing.clone());
        }
        let merchant = self.store.update(|state| {
            if let Some(existing) = state.find_merchant_by_name(name) {
                return existing.clone();
            }
            let merchant = Merchant::new(Uuid::new_v4(), name);
            state.merchants.insert(merchant.id, merchant.clone());
            merchant
        })?;
        Ok(merchant)
    }

    /// Category named `name`. An existing category keeps its type.
    pub fn get_or_create_category(&self, name: &str, category_type: CategoryType) -> Result<Category> {
        if let Some(existing) = self.store.get().find_category_by_name(name) {
            return Ok(existing.clone());
        }
        let category = self.store.update(|state| {
            if let Some(existing) = state.find_category_by_name(name) {
                return existing.clone();
            }
            let category = Category::new(Uuid::new_v4(), name, category_type);
            state.categories.insert(category.id, category.clone());
            category
        })?;
        Ok(category)
    }

    pub fn get_or_create_tag(&self, name: &str) -> Result<Tag> {
        if let Some(existing) = self.store.get().find_tag_by_name(name) {
            return Ok(existing.clone());
        }
        let tag = self.store.update(|state| {
            if let Some(existing) = state.find_tag_by_name(name) {
                return existing.clone();
            }
            let tag = Tag::new(Uuid::new_v4(), name);
            state.tags.insert(tag.id, tag.clone());
            tag
        })?;
        Ok(tag)
    }

    /// Store a new transaction and register its import key, if any
    pub fn insert_transaction(&self, tx: Transaction) -> Result<Transaction> {
        let stored = self.store.update(|state| {
            if let Some(key) = &tx.import_key {
                state.import_keys.insert(key.clone(), tx.id);
            }
            state.transactions.insert(tx.id, tx.clone());
            tx
        })?;
        Ok(stored)
    }

    /// Drop every split of the transaction and write the given ones
    pub fn replace_transaction_splits(
        &self,
        transaction_id: Uuid,
        splits: &[(Uuid, Decimal)],
    ) -> Result<Vec<TransactionSplit>> {
        let written = self.store.update(|state| {
            state.splits.retain(|_, s| s.transaction_id != transaction_id);
            splits
                .iter()
                .map(|(category_id, amount)| {
                    let split = TransactionSplit::new(transaction_id, *category_id, *amount);
                    state.splits.insert(split.id, split.clone());
                    split
                })
                .collect::<Vec<_>>()
        })?;
        Ok(written)
    }

    /// Assign the whole transaction to one category
    pub fn categorize(&self, transaction_id: Uuid, category_id: Uuid, amount: Decimal) -> Result<TransactionSplit> {
        let mut written = self.replace_transaction_splits(transaction_id, &[(category_id, amount)])?;
        written
            .pop()
            .ok_or_else(|| anyhow::anyhow!("No split written for transaction {}", transaction_id))
    }

    pub fn link_tag(&self, transaction_id: Uuid, tag_id: Uuid) -> Result<()> {
        let link = TransactionTag::new(transaction_id, tag_id);
        self.store.update(|state| {
            state.transaction_tags.insert(link.key(), link);
        })?;
        Ok(())
    }

    /// Remove every tag link of the transaction
    pub fn clear_tags(&self, transaction_id: Uuid) -> Result<()> {
        self.store.update(|state| {
            state
                .transaction_tags
                .retain(|_, link| link.transaction_id != transaction_id);
        })?;
        Ok(())
    }

    /// Insert or update the budget row for (category, month)
    pub fn upsert_budget(
        &self,
        category: &Category,
        month: Month,
        amount: Decimal,
        currency_id: Uuid,
    ) -> Result<BudgetRow> {
        let start_date = month.start_date();
        let row = self.store.update(|state| {
            let existing = state
                .budgets
                .values_mut()
                .find(|b| b.category_id == category.id && b.start_date == start_date);

            match existing {
                Some(row) => {
                    row.budgeted_amount = amount;
                    row.currency_id = currency_id;
                    row.name = category.name.clone();
                    row.clone()
                }
                None => {
                    let row = BudgetRow {
                        id: Uuid::new_v4(),
                        category_id: category.id,
                        name: category.name.clone(),
                        budgeted_amount: amount,
                        currency_id,
                        start_date,
                        end_date: None,
                        is_recurring: false,
                    };
                    state.budgets.insert(row.id, row.clone());
                    row
                }
            }
        })?;
        Ok(row)
    }

    pub fn set_default_currency_code(&self, code: &str) -> Result<String> {
        let code = Currency::normalize_code(code);
        if code.is_empty() {
            anyhow::bail!("Currency code cannot be empty");
        }
        let stored = code.clone();
        self.store.update(move |state| state.settings.default_currency_code = stored)?;
        Ok(code)
    }

    pub fn set_default_account_type(&self, account_type: &str) -> Result<String> {
        let account_type = account_type.trim().to_string();
        if account_type.is_empty() {
            anyhow::bail!("Account type cannot be empty");
        }
        let stored = account_type.clone();
        self.store.update(move |state| state.settings.default_account_type = stored)?;
        Ok(account_type)
    }

    /// Wipe all budget data and settings
    pub fn reset(&self) -> Result<()> {
        self.store.reset()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStorage;
    use crate::store::STATE_KEY;
    use chrono::NaiveDate;

    fn ledger() -> LedgerService {
        let store = BudgetStore::open(Arc::new(MemoryStorage::new()), STATE_KEY).unwrap();
        LedgerService::new(Arc::new(store))
    }

    #[test]
    fn test_get_or_create_is_case_insensitive() {
        let ledger = ledger();
        let usd = ledger.get_or_create_currency("usd").unwrap();
        assert_eq!(usd.code, "USD");
        assert_eq!(ledger.get_or_create_currency(" USD ").unwrap().id, usd.id);

        let a = ledger.get_or_create_account("Checking", usd.id).unwrap();
        let b = ledger.get_or_create_account("CHECKING", usd.id).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(b.name, "Checking");
        assert_eq!(a.account_type, "checking");

        let m = ledger.get_or_create_merchant("  Blue Bottle ").unwrap();
        assert_eq!(m.name, "Blue Bottle");
        assert_eq!(ledger.get_or_create_merchant("blue bottle").unwrap().id, m.id);

        let state = ledger.state();
        assert_eq!(state.currencies.len(), 1);
        assert_eq!(state.accounts.len(), 1);
        assert_eq!(state.merchants.len(), 1);
    }

    #[test]
    fn test_category_keeps_first_type() {
        let ledger = ledger();
        let c = ledger.get_or_create_category("Refunds", CategoryType::Income).unwrap();
        let again = ledger.get_or_create_category("refunds", CategoryType::Expense).unwrap();
        assert_eq!(again.id, c.id);
        assert_eq!(again.category_type, CategoryType::Income);
    }

    #[test]
    fn test_new_account_uses_settings_type() {
        let ledger = ledger();
        ledger.set_default_account_type("savings").unwrap();
        let usd = ledger.get_or_create_currency("USD").unwrap();
        let account = ledger.get_or_create_account("Rainy Day", usd.id).unwrap();
        assert_eq!(account.account_type, "savings");
    }

    #[test]
    fn test_replace_splits() {
        let ledger = ledger();
        let usd = ledger.get_or_create_currency("USD").unwrap();
        let account = ledger.get_or_create_account("Checking", usd.id).unwrap();
        let tx = ledger
            .insert_transaction(Transaction::new(
                Uuid::new_v4(),
                account.id,
                Decimal::new(-1250, 2),
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                usd.id,
            ))
            .unwrap();

        let food = ledger.get_or_create_category("Food", CategoryType::Expense).unwrap();
        let fun = ledger.get_or_create_category("Fun", CategoryType::Expense).unwrap();
        ledger.categorize(tx.id, food.id, tx.amount).unwrap();
        ledger.categorize(tx.id, fun.id, tx.amount).unwrap();

        let state = ledger.state();
        let splits = state.splits_for(tx.id);
        assert_eq!(splits.len(), 1);
        assert_eq!(splits[0].category_id, fun.id);
        assert_eq!(splits[0].amount, Decimal::new(-1250, 2));
    }

    #[test]
    fn test_upsert_budget_by_category_and_month() {
        let ledger = ledger();
        let usd = ledger.get_or_create_currency("USD").unwrap();
        let food = ledger.get_or_create_category("Food", CategoryType::Expense).unwrap();
        let month: Month = "2024-05".parse().unwrap();

        let first = ledger.upsert_budget(&food, month, Decimal::new(300, 0), usd.id).unwrap();
        let second = ledger.upsert_budget(&food, month, Decimal::new(450, 0), usd.id).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.start_date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());

        let state = ledger.state();
        assert_eq!(state.budgets.len(), 1);
        assert_eq!(state.budgets[&first.id].budgeted_amount, Decimal::new(450, 0));
    }

    #[test]
    fn test_settings() {
        let ledger = ledger();
        assert_eq!(ledger.set_default_currency_code(" eur ").unwrap(), "EUR");
        assert!(ledger.set_default_currency_code("  ").is_err());
        assert_eq!(ledger.state().settings.default_currency_code, "EUR");

        ledger.reset().unwrap();
        assert_eq!(ledger.state().settings.default_currency_code, "USD");
    }
}
