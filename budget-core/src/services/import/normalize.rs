//! Field normalizers for amounts and dates

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_decimal::Decimal;

/// Date-only formats tried after the ISO and slash/dash forms
const FALLBACK_DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%Y-%m-%d",
    "%Y.%m.%d",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// Date-time formats; only the calendar day is kept
const FALLBACK_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

fn iso_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"))
}

fn numeric_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4})$").expect("valid regex"))
}

/// Parse a free-form amount.
///
/// Everything except digits, `-`, `,` and `.` is dropped. When both `,` and
/// `.` appear the commas are thousands separators; otherwise a comma is the
/// decimal point. Returns `None` for blank or unparsable input.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '-' | ',' | '.'))
        .collect();

    let normalized = if cleaned.contains(',') && cleaned.contains('.') {
        cleaned.replace(',', "")
    } else {
        cleaned.replace(',', ".")
    };

    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<Decimal>().ok()
}

/// Parse a free-form date into a calendar day.
///
/// `YYYY-MM-DD` is taken as is. `A/B/YYYY` (or with dashes) is read month
/// first: A is the month when it is 1-12, else B is. Anything else goes
/// through a fixed list of common formats.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if iso_date_re().is_match(s) {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
    }

    if let Some(caps) = numeric_date_re().captures(s) {
        let a: u32 = caps[1].parse().ok()?;
        let b: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;

        let mut candidates = Vec::with_capacity(2);
        if (1..=12).contains(&a) {
            candidates.push((a, b));
        }
        if (1..=12).contains(&b) {
            candidates.push((b, a));
        }
        return candidates
            .into_iter()
            .find_map(|(month, day)| NaiveDate::from_ymd_opt(year, month, day));
    }

    parse_date_fallback(s)
}

fn parse_date_fallback(s: &str) -> Option<NaiveDate> {
    for fmt in FALLBACK_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    for fmt in FALLBACK_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    // Offsets are ignored: the day is the one written in the input
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local().date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_local().date());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_amount_separators() {
        assert_eq!(parse_amount("1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("1234,56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("-42.50"), Some(dec("-42.50")));
    }

    #[test]
    fn test_amount_strips_symbols() {
        assert_eq!(parse_amount(" $ -1,000.00 "), Some(dec("-1000.00")));
        assert_eq!(parse_amount("€12"), Some(dec("12")));
        assert_eq!(parse_amount("12 USD"), Some(dec("12")));
    }

    #[test]
    fn test_amount_invalid() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("1.2.3"), None);
        assert_eq!(parse_amount("--5"), None);
    }

    #[test]
    fn test_iso_date_identity() {
        assert_eq!(parse_date("2024-02-29"), Some(day(2024, 2, 29)));
        assert_eq!(parse_date(" 2024-01-15 "), Some(day(2024, 1, 15)));
        assert_eq!(parse_date("2023-02-29"), None);
    }

    #[test]
    fn test_month_first_tie_break() {
        assert_eq!(parse_date("03/04/2024"), Some(day(2024, 3, 4)));
        assert_eq!(parse_date("3-4-2024"), Some(day(2024, 3, 4)));
        // First part can't be a month, so it is the day
        assert_eq!(parse_date("25/12/2024"), Some(day(2024, 12, 25)));
        // Neither part is a month
        assert_eq!(parse_date("13/13/2024"), None);
        // Month-first reading is not a real day and no other reading exists
        assert_eq!(parse_date("02/30/2024"), None);
        assert_eq!(parse_date("04/31/2024"), None);
        assert_eq!(parse_date("12/02/2024"), Some(day(2024, 12, 2)));
    }

    #[test]
    fn test_ambiguous_candidates() {
        assert_eq!(parse_date("31/02/2024"), None);
        assert_eq!(parse_date("11/31/2024"), None);
        assert_eq!(parse_date("06/07/2024"), Some(day(2024, 6, 7)));
        // 13 cannot be a month, so the second part is
        assert_eq!(parse_date("13/12/2024"), Some(day(2024, 12, 13)));
    }

    #[test]
    fn test_fallback_formats() {
        assert_eq!(parse_date("2024/01/05"), Some(day(2024, 1, 5)));
        assert_eq!(parse_date("2024-1-5"), Some(day(2024, 1, 5)));
        assert_eq!(parse_date("Jan 5, 2024"), Some(day(2024, 1, 5)));
        assert_eq!(parse_date("January 5, 2024"), Some(day(2024, 1, 5)));
        assert_eq!(parse_date("5 Jan 2024"), Some(day(2024, 1, 5)));
        assert_eq!(parse_date("2024-01-05 23:30:00"), Some(day(2024, 1, 5)));
        assert_eq!(parse_date("2024-01-05T23:30:00-08:00"), Some(day(2024, 1, 5)));
    }

    #[test]
    fn test_date_invalid() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2024"), None);
    }
}
