//! Column mapping: semantic fields and the header-name heuristic

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic fields a CSV column can be mapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvField {
    Date,
    Account,
    Amount,
    Currency,
    Description,
    Merchant,
    Category,
    Tags,
    Notes,
}

impl CsvField {
    pub const ALL: [CsvField; 9] = [
        CsvField::Date,
        CsvField::Account,
        CsvField::Amount,
        CsvField::Currency,
        CsvField::Description,
        CsvField::Merchant,
        CsvField::Category,
        CsvField::Tags,
        CsvField::Notes,
    ];

    /// Fields a commit cannot run without
    pub const REQUIRED: [CsvField; 3] = [CsvField::Date, CsvField::Account, CsvField::Amount];

    pub fn as_str(&self) -> &'static str {
        match self {
            CsvField::Date => "date",
            CsvField::Account => "account",
            CsvField::Amount => "amount",
            CsvField::Currency => "currency",
            CsvField::Description => "description",
            CsvField::Merchant => "merchant",
            CsvField::Category => "category",
            CsvField::Tags => "tags",
            CsvField::Notes => "notes",
        }
    }

    /// Normalized header names recognized for this field
    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            CsvField::Date => &["date", "transactiondate", "posteddate"],
            CsvField::Account => &["account", "accountname"],
            CsvField::Amount => &["amount", "amt", "value"],
            CsvField::Currency => &["currency", "ccy"],
            CsvField::Description => &["description", "desc", "narrative"],
            CsvField::Merchant => &["merchant", "payee"],
            CsvField::Category => &["category", "envelope"],
            CsvField::Tags => &["tags", "tag"],
            CsvField::Notes => &["notes", "note", "memo"],
        }
    }

    pub fn matches_header(&self, header: &str) -> bool {
        let normalized = normalize_header_name(header);
        self.synonyms().contains(&normalized.as_str())
    }
}

impl fmt::Display for CsvField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CsvField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CsvField::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("Unknown field: {}", s))
    }
}

/// Which CSV header feeds each semantic field. Unset fields are unmapped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CsvMapping {
    fn slot(&self, field: CsvField) -> &Option<String> {
        match field {
            CsvField::Date => &self.date,
            CsvField::Account => &self.account,
            CsvField::Amount => &self.amount,
            CsvField::Currency => &self.currency,
            CsvField::Description => &self.description,
            CsvField::Merchant => &self.merchant,
            CsvField::Category => &self.category,
            CsvField::Tags => &self.tags,
            CsvField::Notes => &self.notes,
        }
    }

    fn slot_mut(&mut self, field: CsvField) -> &mut Option<String> {
        match field {
            CsvField::Date => &mut self.date,
            CsvField::Account => &mut self.account,
            CsvField::Amount => &mut self.amount,
            CsvField::Currency => &mut self.currency,
            CsvField::Description => &mut self.description,
            CsvField::Merchant => &mut self.merchant,
            CsvField::Category => &mut self.category,
            CsvField::Tags => &mut self.tags,
            CsvField::Notes => &mut self.notes,
        }
    }

    /// Header mapped to `field`; an empty header name counts as unmapped
    pub fn get(&self, field: CsvField) -> Option<&str> {
        self.slot(field).as_deref().filter(|h| !h.is_empty())
    }

    pub fn set(&mut self, field: CsvField, header: impl Into<String>) {
        *self.slot_mut(field) = Some(header.into());
    }

    /// Mapped fields in canonical order
    pub fn entries(&self) -> Vec<(CsvField, &str)> {
        CsvField::ALL
            .iter()
            .filter_map(|f| self.get(*f).map(|h| (*f, h)))
            .collect()
    }

    /// First required field without a mapping
    pub fn missing_required(&self) -> Option<CsvField> {
        CsvField::REQUIRED
            .iter()
            .copied()
            .find(|f| self.get(*f).is_none())
    }
}

/// Lowercase, trim and strip all whitespace
pub fn normalize_header_name(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Guess a mapping from header names. The first matching header wins.
pub fn suggest_mapping(headers: &[String]) -> CsvMapping {
    let mut mapping = CsvMapping::default();
    for header in headers {
        for field in CsvField::ALL {
            if mapping.slot(field).is_none() && field.matches_header(header) {
                mapping.set(field, header.clone());
            }
        }
    }
    mapping
}
