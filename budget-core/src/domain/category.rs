//! Category ("envelope") domain model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Expense,
    Income,
    Transfer,
}

impl CategoryType {
    /// Expense for outflows, income for everything else (zero included)
    pub fn for_amount(amount: rust_decimal::Decimal) -> Self {
        if amount < rust_decimal::Decimal::ZERO {
            CategoryType::Expense
        } else {
            CategoryType::Income
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Expense => "expense",
            CategoryType::Income => "income",
            CategoryType::Transfer => "transfer",
        }
    }
}

/// A budgeting category. Parent links are stored but never traversed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "category_id")]
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_category_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Category {
    pub fn new(id: Uuid, name: impl Into<String>, category_type: CategoryType) -> Self {
        Self {
            id,
            name: name.into().trim().to_string(),
            parent_category_id: None,
            category_type,
            description: None,
        }
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_type_from_amount_sign() {
        assert_eq!(CategoryType::for_amount(Decimal::new(-1250, 2)), CategoryType::Expense);
        assert_eq!(CategoryType::for_amount(Decimal::new(1250, 2)), CategoryType::Income);
        assert_eq!(CategoryType::for_amount(Decimal::ZERO), CategoryType::Income);
    }

    #[test]
    fn test_category_type_serialization() {
        let category = Category::new(Uuid::new_v4(), "Groceries", CategoryType::Expense);
        let json = serde_json::to_value(&category).unwrap();
        assert_eq!(json["type"], "expense");
        assert!(json.get("parent_category_id").is_none());
    }
}
