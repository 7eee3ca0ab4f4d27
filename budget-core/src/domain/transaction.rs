//! Transaction domain model

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of every import key
pub const IMPORT_KEY_PREFIX: &str = "imp_";

/// Transaction type tag, derived from the amount sign on import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Expense,
    Income,
    Transfer,
    Adjustment,
}

impl TransactionType {
    /// negative → expense, positive → income, zero → adjustment
    pub fn from_amount(amount: Decimal) -> Self {
        if amount < Decimal::ZERO {
            TransactionType::Expense
        } else if amount > Decimal::ZERO {
            TransactionType::Income
        } else {
            TransactionType::Adjustment
        }
    }
}

/// A single financial transaction belonging to an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "transaction_id")]
    pub id: Uuid,
    pub account_id: Uuid,
    pub transaction_date: NaiveDate,
    /// Negative = expense, positive = income
    pub amount: Decimal,
    pub currency_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Fingerprint used to make re-imports idempotent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_key: Option<String>,
}

impl Transaction {
    /// Create a new transaction with required fields
    pub fn new(
        id: Uuid,
        account_id: Uuid,
        amount: Decimal,
        transaction_date: NaiveDate,
        currency_id: Uuid,
    ) -> Self {
        Self {
            id,
            account_id,
            transaction_date,
            amount,
            currency_id,
            description: None,
            merchant_id: None,
            transaction_type: TransactionType::from_amount(amount),
            notes: None,
            import_key: None,
        }
    }

    /// Month bucket `YYYY-MM` of the transaction date
    pub fn month_key(&self) -> String {
        self.transaction_date.format("%Y-%m").to_string()
    }
}

/// Portion of a transaction assigned to one category.
/// Amount carries the same sign as the parent transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSplit {
    #[serde(rename = "split_id")]
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub category_id: Uuid,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TransactionSplit {
    pub fn new(transaction_id: Uuid, category_id: Uuid, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            category_id,
            amount,
            notes: None,
        }
    }
}

/// Build the deduplication key for an imported row.
///
/// Textual fields are lowercased, the amount is rounded to 4 decimals and the
/// joined string is folded with `h = h * 31 + unit` over its UTF-16 code
/// units in wrapping 32-bit arithmetic. Collisions are not resolved.
pub fn build_import_key(
    date: NaiveDate,
    account: &str,
    amount: Decimal,
    description: Option<&str>,
    merchant: Option<&str>,
) -> String {
    // -0 and 0 must produce the same key
    let amount = if amount.is_zero() { Decimal::ZERO } else { amount };

    let base = format!(
        "{}|{}|{}|{}|{}",
        date.format("%Y-%m-%d"),
        account.to_lowercase(),
        fixed4(amount),
        description.unwrap_or("").to_lowercase(),
        merchant.unwrap_or("").to_lowercase(),
    );

    let hash = base
        .encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as u32));

    format!("{}{:x}", IMPORT_KEY_PREFIX, hash)
}

/// `amount` with exactly four decimals, half away from zero.
///
/// Built from the mantissa because `Display` with a precision overflows its
/// buffer near the top of the `Decimal` range.
fn fixed4(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
    // scale <= 4 here and the mantissa is at most 96 bits, so this fits an i128
    let units = rounded.mantissa() * 10i128.pow(4 - rounded.scale());
    let sign = if units < 0 { "-" } else { "" };
    let abs = units.unsigned_abs();
    format!("{}{}.{:04}", sign, abs / 10_000, abs % 10_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_type_from_amount() {
        assert_eq!(TransactionType::from_amount(Decimal::new(-500, 2)), TransactionType::Expense);
        assert_eq!(TransactionType::from_amount(Decimal::new(500, 2)), TransactionType::Income);
        assert_eq!(TransactionType::from_amount(Decimal::ZERO), TransactionType::Adjustment);
    }

    #[test]
    fn test_import_key_known_value() {
        let key = build_import_key(
            date(2024, 1, 15),
            "Checking",
            Decimal::new(-4250, 2),
            Some("Coffee"),
            Some("Blue Bottle"),
        );
        assert_eq!(key, "imp_65339131");
    }

    #[test]
    fn test_fixed4() {
        assert_eq!(fixed4(Decimal::new(-4250, 2)), "-42.5000");
        assert_eq!(fixed4(Decimal::new(5, 0)), "5.0000");
        assert_eq!(fixed4(Decimal::new(-5, 3)), "-0.0050");
        assert_eq!(fixed4(Decimal::new(123456, 5)), "1.2346");
        assert_eq!(fixed4(Decimal::new(-123455, 5)), "-1.2346");
        assert_eq!(fixed4(Decimal::MAX), "79228162514264337593543950335.0000");
        assert_eq!(fixed4(Decimal::MIN), "-79228162514264337593543950335.0000");
    }

    #[test]
    fn test_import_key_rounds_extra_decimals() {
        let key = |amount| build_import_key(date(2024, 1, 15), "Checking", amount, None, None);
        assert_eq!(key(Decimal::new(123456, 5)), key(Decimal::new(12346, 4)));
        assert_ne!(key(Decimal::new(123456, 5)), key(Decimal::new(12345, 4)));
    }

    #[test]
    fn test_import_key_at_decimal_limits() {
        let max = build_import_key(date(2024, 1, 15), "Checking", Decimal::MAX, None, None);
        let min = build_import_key(date(2024, 1, 15), "Checking", Decimal::MIN, None, None);
        assert!(max.starts_with(IMPORT_KEY_PREFIX));
        assert_ne!(max, min);
    }

    #[test]
    fn test_import_key_is_case_insensitive_for_text() {
        let a = build_import_key(date(2024, 1, 15), "CHECKING", Decimal::new(-4250, 2), Some("COFFEE"), Some("blue bottle"));
        let b = build_import_key(date(2024, 1, 15), "checking", Decimal::new(-425, 1), Some("coffee"), Some("Blue Bottle"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_import_key_is_order_sensitive() {
        let a = build_import_key(date(2024, 1, 15), "Checking", Decimal::ONE, Some("x"), None);
        let b = build_import_key(date(2024, 1, 15), "Checking", Decimal::ONE, None, Some("x"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_import_key_negative_zero() {
        let zero = build_import_key(date(2024, 1, 15), "Checking", Decimal::ZERO, None, None);
        let neg_zero = build_import_key(date(2024, 1, 15), "Checking", -Decimal::ZERO, None, None);
        assert_eq!(zero, neg_zero);
        assert_eq!(zero, "imp_2a5c2987");
    }

    #[test]
    fn test_transaction_serialization_round_trip() {
        let mut tx = Transaction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Decimal::new(-1999, 2),
            date(2025, 3, 9),
            Uuid::new_v4(),
        );
        tx.description = Some("Lunch".to_string());
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["transaction_date"], "2025-03-09");
        assert_eq!(json["type"], "expense");

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
        assert_eq!(back.month_key(), "2025-03");
    }
}
