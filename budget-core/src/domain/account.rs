//! Account and currency domain models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A currency referenced by accounts, transactions and budgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    #[serde(rename = "currency_id")]
    pub id: Uuid,
    /// ISO 4217 code, normalized to uppercase
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl Currency {
    pub fn new(id: Uuid, code: &str) -> Self {
        Self {
            id,
            code: Self::normalize_code(code),
            name: None,
            symbol: None,
        }
    }

    /// Normalize currency code to uppercase
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }
}

/// A financial account the user imports transactions into
/// Note: account_type is freeform ("checking", "credit_card", ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "account_id")]
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: String,
    pub currency_id: Uuid,
    pub initial_balance: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
}

impl Account {
    /// Create a new active account with a zero opening balance
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        account_type: impl Into<String>,
        currency_id: Uuid,
    ) -> Self {
        Self {
            id,
            name: name.into().trim().to_string(),
            account_type: account_type.into(),
            currency_id,
            initial_balance: Decimal::ZERO,
            description: None,
            is_active: true,
        }
    }

    /// Case-insensitive name comparison used by get-or-create lookups
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }

    /// Validate account data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("account name cannot be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_normalization() {
        assert_eq!(Currency::normalize_code("usd"), "USD");
        assert_eq!(Currency::normalize_code(" eur "), "EUR");
        assert_eq!(Currency::new(Uuid::new_v4(), "gbp").code, "GBP");
    }

    #[test]
    fn test_account_name_lookup() {
        let account = Account::new(Uuid::new_v4(), "  Everyday Checking ", "checking", Uuid::new_v4());
        assert_eq!(account.name, "Everyday Checking");
        assert!(account.has_name("everyday checking"));
        assert!(account.has_name(" EVERYDAY CHECKING"));
        assert!(!account.has_name("Savings"));
    }

    #[test]
    fn test_account_validation() {
        let mut account = Account::new(Uuid::new_v4(), "Test Account", "checking", Uuid::new_v4());
        assert!(account.validate().is_ok());

        account.name = "".to_string();
        assert!(account.validate().is_err());
    }

    #[test]
    fn test_account_serializes_with_document_keys() {
        let account = Account::new(Uuid::new_v4(), "Card", "credit_card", Uuid::new_v4());
        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("account_id").is_some());
        assert_eq!(json["type"], "credit_card");
        assert_eq!(json["is_active"], true);
    }
}
