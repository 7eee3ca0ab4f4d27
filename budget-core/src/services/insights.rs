//! Insights service - read-only monthly aggregates

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::Month;
use crate::store::BudgetStore;

pub const DEFAULT_UNCATEGORIZED_LIMIT: usize = 50;
pub const DEFAULT_TOP_CATEGORIES: usize = 12;

/// Fallback name for references that no longer resolve
const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UncategorizedTransaction {
    pub transaction_id: Uuid,
    pub date: NaiveDate,
    pub account: String,
    pub merchant: String,
    pub description: String,
    pub amount: Decimal,
    pub currency_code: String,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UncategorizedList {
    pub month: Month,
    pub transactions: Vec<UncategorizedTransaction>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpend {
    pub category_id: Uuid,
    pub category_name: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingByCategory {
    pub month: Month,
    pub rows: Vec<CategorySpend>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub day: NaiveDate,
    pub income: Decimal,
    pub expense: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingTrend {
    pub month: Month,
    pub rows: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub month: Month,
    pub income: Decimal,
    /// Positive total of outflows
    pub expense: Decimal,
    pub net: Decimal,
    pub uncategorized: usize,
    pub transaction_count: usize,
    pub currency_code: String,
}

/// Insights service for summary views
pub struct InsightsService {
    store: Arc<BudgetStore>,
}

impl InsightsService {
    pub fn new(store: Arc<BudgetStore>) -> Self {
        Self { store }
    }

    /// Every month from the earliest to the latest transaction, inclusive
    pub fn available_months(&self) -> Vec<Month> {
        let state = self.store.get();
        let months = || state.transactions.values().map(|tx| Month::of(tx.transaction_date));
        match (months().min(), months().max()) {
            (Some(min), Some(max)) => Month::between_inclusive(min, max),
            _ => Vec::new(),
        }
    }

    /// Transactions in the month with no split, newest first
    pub fn uncategorized(&self, month: Option<Month>, limit: Option<usize>) -> UncategorizedList {
        let month = month.unwrap_or_else(Month::current);
        let limit = limit.unwrap_or(DEFAULT_UNCATEGORIZED_LIMIT);
        let state = self.store.get();
        let categorized = state.categorized_transaction_ids();

        let mut txs: Vec<_> = state
            .transactions
            .values()
            .filter(|tx| month.contains(tx.transaction_date) && !categorized.contains(&tx.id))
            .collect();
        txs.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));

        let transactions = txs
            .into_iter()
            .take(limit)
            .map(|tx| UncategorizedTransaction {
                transaction_id: tx.id,
                date: tx.transaction_date,
                account: state
                    .accounts
                    .get(&tx.account_id)
                    .map(|a| a.name.clone())
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                merchant: tx
                    .merchant_id
                    .and_then(|id| state.merchants.get(&id))
                    .map(|m| m.name.clone())
                    .unwrap_or_default(),
                description: tx.description.clone().unwrap_or_default(),
                amount: tx.amount,
                currency_code: state
                    .currencies
                    .get(&tx.currency_id)
                    .map(|c| c.code.clone())
                    .unwrap_or_default(),
                notes: tx.notes.clone().unwrap_or_default(),
            })
            .collect();

        UncategorizedList { month, transactions }
    }

    /// Outflow per category in the month, largest first
    pub fn spending_by_category(&self, month: Option<Month>, top_n: Option<usize>) -> SpendingByCategory {
        let month = month.unwrap_or_else(Month::current);
        let top_n = top_n.unwrap_or(DEFAULT_TOP_CATEGORIES);
        let state = self.store.get();

        let mut totals: HashMap<Uuid, Decimal> = HashMap::new();
        for split in state.splits.values() {
            let Some(tx) = state.transactions.get(&split.transaction_id) else {
                continue;
            };
            if !month.contains(tx.transaction_date) || split.amount >= Decimal::ZERO {
                continue;
            }
            let total = totals.entry(split.category_id).or_default();
            *total = total.saturating_add(split.amount.abs());
        }

        let mut rows: Vec<CategorySpend> = totals
            .into_iter()
            .map(|(category_id, total)| CategorySpend {
                category_id,
                category_name: state
                    .categories
                    .get(&category_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                total,
            })
            .collect();
        rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category_name.cmp(&b.category_name)));
        rows.truncate(top_n);

        SpendingByCategory { month, rows }
    }

    /// Daily income and expense totals in the month, oldest day first
    pub fn spending_trend(&self, month: Option<Month>) -> SpendingTrend {
        let month = month.unwrap_or_else(Month::current);
        let state = self.store.get();

        let mut by_day: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
        for tx in state.transactions.values().filter(|tx| month.contains(tx.transaction_date)) {
            let (income, expense) = by_day.entry(tx.transaction_date).or_default();
            if tx.amount > Decimal::ZERO {
                *income = income.saturating_add(tx.amount);
            } else if tx.amount < Decimal::ZERO {
                *expense = expense.saturating_add(tx.amount.abs());
            }
        }

        let rows = by_day
            .into_iter()
            .map(|(day, (income, expense))| TrendPoint { day, income, expense })
            .collect();

        SpendingTrend { month, rows }
    }

    /// Headline numbers for the month
    pub fn kpis(&self, month: Option<Month>) -> Kpis {
        let month = month.unwrap_or_else(Month::current);
        let state = self.store.get();
        let categorized = state.categorized_transaction_ids();

        let mut income = Decimal::ZERO;
        let mut expense = Decimal::ZERO;
        let mut uncategorized = 0;
        let mut transaction_count = 0;

        for tx in state.transactions.values().filter(|tx| month.contains(tx.transaction_date)) {
            transaction_count += 1;
            if tx.amount > Decimal::ZERO {
                income = income.saturating_add(tx.amount);
            } else if tx.amount < Decimal::ZERO {
                expense = expense.saturating_add(tx.amount.abs());
            }
            if !categorized.contains(&tx.id) {
                uncategorized += 1;
            }
        }

        let currency_code = state
            .find_currency_by_code(&state.settings.default_currency_code)
            .map(|c| c.code.clone())
            .unwrap_or_else(|| state.settings.default_currency_code.clone());

        Kpis {
            month,
            income,
            expense,
            net: income.saturating_sub(expense),
            uncategorized,
            transaction_count,
            currency_code,
        }
    }
}
