//! Tag domain models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A free-text label attached to transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "tag_id")]
    pub id: Uuid,
    pub name: String,
}

impl Tag {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into().trim().to_string(),
        }
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }

    /// Split a raw tag cell on `|` or `,`, trimming and dropping empties
    pub fn split_names(raw: &str) -> Vec<String> {
        raw.split(['|', ','])
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect()
    }
}

/// Link between a transaction and a tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionTag {
    pub transaction_id: Uuid,
    pub tag_id: Uuid,
}

impl TransactionTag {
    pub fn new(transaction_id: Uuid, tag_id: Uuid) -> Self {
        Self { transaction_id, tag_id }
    }

    /// Composite key `transactionId:tagId` used by the state document
    pub fn key(&self) -> String {
        format!("{}:{}", self.transaction_id, self.tag_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_names() {
        assert_eq!(Tag::split_names("food| weekly ,, groceries"), vec!["food", "weekly", "groceries"]);
        assert!(Tag::split_names(" | , ").is_empty());
    }

    #[test]
    fn test_transaction_tag_key() {
        let link = TransactionTag::new(Uuid::nil(), Uuid::nil());
        assert_eq!(
            link.key(),
            "00000000-0000-0000-0000-000000000000:00000000-0000-0000-0000-000000000000"
        );
    }
}
