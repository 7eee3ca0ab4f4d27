//! Demo data source
//!
//! Generates a sample bank export as CSV text so demo mode goes through the
//! same import path as real data:
//! - 90 days of transactions across a checking account and two cards
//! - most rows carry a category, a few are left for manual categorization
//! - monthly envelope budgets for the common expense categories

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;

/// Header row of the generated CSV
pub const DEMO_HEADERS: [&str; 8] = [
    "Date", "Account", "Amount", "Currency", "Description", "Payee", "Category", "Tags",
];

/// Days of history generated
pub const DEMO_DAYS: i64 = 90;

const CHECKING: &str = "Everyday Checking";
const TRAVEL_CARD: &str = "Travel Rewards Card";
const CASHBACK_CARD: &str = "Cashback Card";

/// One generated row
#[derive(Debug, Clone, PartialEq)]
pub struct DemoRow {
    pub date: NaiveDate,
    pub account: &'static str,
    pub amount: Decimal,
    pub description: &'static str,
    pub payee: &'static str,
    /// Empty for rows left uncategorized
    pub category: &'static str,
    pub tags: &'static str,
}

/// Monthly envelope amounts seeded in demo mode
pub fn demo_budgets() -> Vec<(&'static str, Decimal)> {
    vec![
        ("Rent", Decimal::new(2250, 0)),
        ("Groceries", Decimal::new(600, 0)),
        ("Dining", Decimal::new(300, 0)),
        ("Utilities", Decimal::new(250, 0)),
        ("Coffee", Decimal::new(80, 0)),
        ("Transportation", Decimal::new(220, 0)),
        ("Subscriptions", Decimal::new(45, 0)),
    ]
}

/// Generate demo rows for the `DEMO_DAYS` days ending on `today`, oldest first
pub fn generate_demo_rows(today: NaiveDate) -> Vec<DemoRow> {
    let mut rows = Vec::new();

    for days_ago in (0..DEMO_DAYS).rev() {
        let date = today - Duration::days(days_ago);
        let day_of_month = date.day();
        let mut push = |account, cents: i64, description, payee, category, tags| {
            rows.push(DemoRow {
                date,
                account,
                amount: Decimal::new(cents, 2),
                description,
                payee,
                category,
                tags,
            });
        };

        // Paycheck on the 1st and 15th
        if day_of_month == 1 || day_of_month == 15 {
            push(CHECKING, 425000, "ACME CORP PAYROLL DIRECT DEPOSIT", "Acme Corp", "Salary", "income|salary");
        }

        if day_of_month == 5 {
            push(CHECKING, -225000, "APARTMENT RENT PAYMENT", "Maple Court Apartments", "Rent", "housing");
        }

        if day_of_month == 10 {
            push(CHECKING, -15000, "CITY UTILITIES - ELECTRIC", "City Utilities", "Utilities", "utilities");
            push(CHECKING, -7500, "COMCAST INTERNET", "Comcast", "Utilities", "utilities|internet");
        }

        if day_of_month == 20 {
            push(CHECKING, -18500, "STATE FARM AUTO INSURANCE", "State Farm", "Insurance", "auto");
        }

        // Groceries every third day
        if days_ago % 3 == 0 {
            let amounts = [-8523i64, -6745, -9234, -7100, -5899, -10523];
            let cents = amounts[days_ago as usize % amounts.len()];
            push(TRAVEL_CARD, cents, "WHOLE FOODS MARKET", "Whole Foods", "Groceries", "food");
        }

        // Coffee every other day
        if days_ago % 2 == 0 {
            push(CASHBACK_CARD, -565, "STARBUCKS", "Starbucks", "Coffee", "food|coffee");
        }

        // Dining out roughly twice a week
        if days_ago % 3 == 1 || days_ago % 7 == 0 {
            let restaurants = [
                ("CHIPOTLE MEXICAN GRILL", "Chipotle", -1250i64),
                ("SWEETGREEN", "Sweetgreen", -1450),
                ("THE CAPITAL GRILLE", "The Capital Grille", -8500),
                ("PHO RESTAURANT", "Pho 88", -2200),
                ("SHAKE SHACK", "Shake Shack", -1875),
            ];
            let (description, payee, cents) = restaurants[days_ago as usize % restaurants.len()];
            push(TRAVEL_CARD, cents, description, payee, "Dining", "food|dining");
        }

        if days_ago % 7 == 0 {
            push(CASHBACK_CARD, -5500, "SHELL OIL", "Shell", "Transportation", "gas");
        }

        if day_of_month == 3 {
            push(TRAVEL_CARD, -1599, "NETFLIX", "Netflix", "Subscriptions", "entertainment");
        }
        if day_of_month == 7 {
            push(TRAVEL_CARD, -1099, "SPOTIFY PREMIUM", "Spotify", "Subscriptions", "entertainment");
        }

        // Shopping is left uncategorized
        if days_ago % 5 == 0 {
            let shops = [
                ("AMAZON.COM", "Amazon", -3299i64),
                ("TARGET", "Target", -7850),
                ("BEST BUY", "Best Buy", -12999),
                ("NORDSTROM", "Nordstrom", -18500),
                ("HOME DEPOT", "Home Depot", -8725),
            ];
            let (description, payee, cents) = shops[days_ago as usize % shops.len()];
            push(TRAVEL_CARD, cents, description, payee, "", "shopping");
        }
    }

    rows
}

/// Render the demo rows as CSV text with `DEMO_HEADERS`
pub fn generate_demo_csv(today: NaiveDate, currency_code: &str) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(DEMO_HEADERS)?;

    for row in generate_demo_rows(today) {
        writer.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            row.account.to_string(),
            row.amount.to_string(),
            currency_code.to_string(),
            row.description.to_string(),
            row.payee.to_string(),
            row.category.to_string(),
            row.tags.to_string(),
        ])?;
    }

    let bytes = writer.into_inner().context("Failed to finish demo CSV")?;
    String::from_utf8(bytes).context("Demo CSV is not UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    #[test]
    fn test_rows_are_deterministic() {
        assert_eq!(generate_demo_rows(today()), generate_demo_rows(today()));
    }

    #[test]
    fn test_rows_span_window_oldest_first() {
        let rows = generate_demo_rows(today());
        assert!(!rows.is_empty());
        assert!(rows.windows(2).all(|w| w[0].date <= w[1].date));
        assert!(rows.iter().all(|r| r.date <= today()));
        assert!(rows.iter().all(|r| r.date > today() - Duration::days(DEMO_DAYS)));
    }

    #[test]
    fn test_some_rows_uncategorized() {
        let rows = generate_demo_rows(today());
        assert!(rows.iter().any(|r| r.category.is_empty()));
        assert!(rows.iter().any(|r| r.amount > Decimal::ZERO));
    }

    #[test]
    fn test_csv_has_header_and_all_rows() {
        let text = generate_demo_csv(today(), "USD").unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Date,Account,Amount,Currency,Description,Payee,Category,Tags"));
        assert_eq!(lines.count(), generate_demo_rows(today()).len());
    }
}
