//! Tool service - JSON entry points for an assistant integration
//!
//! Every tool takes a JSON object of camelCase arguments and returns an
//! `OperationResult` wrapping the JSON form of the service result.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{Month, OperationResult};
use crate::services::import::{CommitOptions, CsvMapping, ImportService};
use crate::services::{EnvelopeService, InsightsService};
use crate::store::BudgetStore;

/// Names of every registered tool
pub const TOOL_NAMES: [&str; 8] = [
    "importCsvPreview",
    "importCsvCommit",
    "getEnvelopeSummary",
    "setEnvelopeBudget",
    "getUncategorizedTransactions",
    "categorizeTransaction",
    "getSpendingByCategory",
    "getSpendingTrend",
];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewArgs {
    csv_text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitArgs {
    csv_text: String,
    mapping: CsvMapping,
    #[serde(default)]
    filename: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct MonthArgs {
    #[serde(default)]
    month: Option<Month>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetBudgetArgs {
    month: Month,
    category_name: String,
    amount: Decimal,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UncategorizedArgs {
    #[serde(default)]
    month: Option<Month>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategorizeArgs {
    transaction_id: Uuid,
    category_name: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SpendingArgs {
    #[serde(default)]
    month: Option<Month>,
    #[serde(default)]
    top_n: Option<usize>,
}

/// Tool dispatcher over the core services
pub struct ToolService {
    store: Arc<BudgetStore>,
    import: Arc<ImportService>,
    envelopes: Arc<EnvelopeService>,
    insights: Arc<InsightsService>,
}

impl ToolService {
    pub fn new(
        store: Arc<BudgetStore>,
        import: Arc<ImportService>,
        envelopes: Arc<EnvelopeService>,
        insights: Arc<InsightsService>,
    ) -> Self {
        Self {
            store,
            import,
            envelopes,
            insights,
        }
    }

    /// Run tool `name` with `args`. Unknown tools and bad arguments fail,
    /// with the tool name attached as context.
    pub fn call(&self, name: &str, args: Value) -> OperationResult<Value> {
        match self.dispatch(name, args) {
            Ok(value) => OperationResult::ok(value),
            Err(e) => {
                let context = HashMap::from([("tool".to_string(), Value::String(name.to_string()))]);
                OperationResult::fail_with_context(e.to_string(), context)
            }
        }
    }

    fn dispatch(&self, name: &str, args: Value) -> Result<Value> {
        match name {
            "importCsvPreview" => {
                let args: PreviewArgs = parse_args(name, args)?;
                to_value(self.import.preview(&args.csv_text)?)
            }
            "importCsvCommit" => {
                let args: CommitArgs = parse_args(name, args)?;
                let options = CommitOptions {
                    filename: args.filename,
                    default_currency_code: Some(self.store.get().settings.default_currency_code.clone()),
                };
                to_value(self.import.commit(&args.csv_text, &args.mapping, &options)?)
            }
            "getEnvelopeSummary" => {
                let args: MonthArgs = parse_optional_args(name, args)?;
                to_value(self.envelopes.summary(args.month.unwrap_or_else(Month::current)))
            }
            "setEnvelopeBudget" => {
                let args: SetBudgetArgs = parse_args(name, args)?;
                to_value(self.envelopes.set_budget(args.month, &args.category_name, args.amount)?)
            }
            "getUncategorizedTransactions" => {
                let args: UncategorizedArgs = parse_optional_args(name, args)?;
                to_value(self.insights.uncategorized(args.month, args.limit))
            }
            "categorizeTransaction" => {
                let args: CategorizeArgs = parse_args(name, args)?;
                to_value(
                    self.envelopes
                        .categorize_transaction(args.transaction_id, &args.category_name)?,
                )
            }
            "getSpendingByCategory" => {
                let args: SpendingArgs = parse_optional_args(name, args)?;
                to_value(self.insights.spending_by_category(args.month, args.top_n))
            }
            "getSpendingTrend" => {
                let args: MonthArgs = parse_optional_args(name, args)?;
                to_value(self.insights.spending_trend(args.month))
            }
            _ => anyhow::bail!("Unknown tool: {}", name),
        }
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args).with_context(|| format!("Invalid arguments for {}", tool))
}

/// Like `parse_args`, but a missing argument object means all defaults
fn parse_optional_args<T: DeserializeOwned + Default>(tool: &str, args: Value) -> Result<T> {
    if args.is_null() {
        return Ok(T::default());
    }
    parse_args(tool, args)
}

fn to_value<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).context("Failed to serialize tool result")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStorage;
    use crate::services::LedgerService;
    use crate::store::STATE_KEY;
    use serde_json::json;
    use tempfile::TempDir;

    fn tools() -> (TempDir, ToolService) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(BudgetStore::open(Arc::new(MemoryStorage::new()), STATE_KEY).unwrap());
        let ledger = Arc::new(LedgerService::new(Arc::clone(&store)));
        let import = Arc::new(ImportService::new(
            Arc::clone(&store),
            Arc::clone(&ledger),
            dir.path().to_path_buf(),
        ));
        let envelopes = Arc::new(EnvelopeService::new(Arc::clone(&store), Arc::clone(&ledger)));
        let insights = Arc::new(InsightsService::new(Arc::clone(&store)));
        (dir, ToolService::new(store, import, envelopes, insights))
    }

    const CSV: &str = "Date,Account,Amount,Category\n2024-05-01,Checking,-12.50,Food\n2024-05-02,Checking,-3,\n";

    #[test]
    fn test_preview_and_commit() {
        let (_dir, tools) = tools();
        let preview = tools.call("importCsvPreview", json!({ "csvText": CSV }));
        assert!(preview.success);
        let data = preview.data.unwrap();
        assert_eq!(data["rowCount"], 2);
        assert_eq!(data["suggestedMapping"]["category"], "Category");

        let commit = tools.call(
            "importCsvCommit",
            json!({ "csvText": CSV, "mapping": data["suggestedMapping"].clone(), "filename": "may.csv" }),
        );
        assert!(commit.success, "{:?}", commit.error);
        let data = commit.data.unwrap();
        assert_eq!(data["successRows"], 2);
        assert_eq!(data["created"]["transactions"], 2);
    }

    #[test]
    fn test_budget_and_queries() {
        let (_dir, tools) = tools();
        let mapping = json!({ "date": "Date", "account": "Account", "amount": "Amount", "category": "Category" });
        tools.call("importCsvCommit", json!({ "csvText": CSV, "mapping": mapping }));

        let set = tools.call(
            "setEnvelopeBudget",
            json!({ "month": "2024-05", "categoryName": "Food", "amount": 100 }),
        );
        assert!(set.success, "{:?}", set.error);

        let summary = tools.call("getEnvelopeSummary", json!({ "month": "2024-05" })).data.unwrap();
        assert_eq!(summary["items"][0]["categoryName"], "Food");
        assert_eq!(summary["uncategorizedCount"], 1);

        let uncategorized = tools
            .call("getUncategorizedTransactions", json!({ "month": "2024-05" }))
            .data
            .unwrap();
        let tx_id = uncategorized["transactions"][0]["transactionId"].clone();

        let categorized = tools.call(
            "categorizeTransaction",
            json!({ "transactionId": tx_id, "categoryName": "Snacks" }),
        );
        assert!(categorized.success);

        let spending = tools
            .call("getSpendingByCategory", json!({ "month": "2024-05", "topN": 1 }))
            .data
            .unwrap();
        assert_eq!(spending["rows"].as_array().unwrap().len(), 1);
        assert_eq!(spending["rows"][0]["categoryName"], "Food");

        let trend = tools.call("getSpendingTrend", json!({ "month": "2024-05" })).data.unwrap();
        assert_eq!(trend["rows"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_failures() {
        let (_dir, tools) = tools();
        let unknown = tools.call("deleteEverything", json!({}));
        assert!(!unknown.success);
        assert_eq!(unknown.error.as_deref(), Some("Unknown tool: deleteEverything"));
        assert_eq!(unknown.context.unwrap()["tool"], "deleteEverything");

        let bad = tools.call("importCsvPreview", json!({ "text": "a,b" }));
        assert!(!bad.success);

        let no_currency = tools.call(
            "setEnvelopeBudget",
            json!({ "month": "2024-05", "categoryName": "Food", "amount": 10 }),
        );
        assert!(!no_currency.success);

        let missing = tools.call(
            "categorizeTransaction",
            json!({ "transactionId": Uuid::new_v4(), "categoryName": "Food" }),
        );
        assert_eq!(missing.error.as_deref(), Some("Transaction not found"));
    }

    #[test]
    fn test_optional_args_may_be_omitted() {
        let (_dir, tools) = tools();
        assert!(tools.call("getSpendingTrend", Value::Null).success);
        assert!(tools.call("getEnvelopeSummary", json!({})).success);
    }

    #[test]
    fn test_tool_names_all_dispatch() {
        let (_dir, tools) = tools();
        for name in TOOL_NAMES {
            let result = tools.call(name, json!({}));
            if let Some(error) = result.error {
                assert!(!error.starts_with("Unknown tool"), "{} is not dispatched", name);
            }
        }
    }
}
