//! Upload service - raw CSV files kept in local storage for later import

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::ports::KeyValueStorage;

/// Storage key prefix of every upload
pub const UPLOAD_KEY_PREFIX: &str = "budget-analyzer:csv-upload:";

/// Largest CSV accepted, in characters
pub const MAX_UPLOAD_CHARS: usize = 4_500_000;

/// A stored CSV with its text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvUpload {
    pub key: String,
    pub filename: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub size_chars: usize,
}

/// Upload metadata, without the text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadInfo {
    pub key: String,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub size_chars: usize,
}

impl From<&CsvUpload> for UploadInfo {
    fn from(upload: &CsvUpload) -> Self {
        Self {
            key: upload.key.clone(),
            filename: upload.filename.clone(),
            created_at: upload.created_at,
            size_chars: upload.size_chars,
        }
    }
}

/// Loose shape used to tell corrupted entries from valid ones
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUpload {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    size_chars: Option<usize>,
}

/// Upload service for locally stored CSV files
pub struct UploadService {
    storage: Arc<dyn KeyValueStorage>,
}

impl UploadService {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Store a CSV under a fresh key
    pub fn save(&self, filename: &str, text: &str) -> Result<UploadInfo> {
        let size_chars = text.chars().count();
        if size_chars > MAX_UPLOAD_CHARS {
            return Err(Error::validation(format!(
                "CSV is too large to store locally ({} chars). Try a smaller file.",
                size_chars
            )));
        }

        let upload = CsvUpload {
            key: format!("{}{}", UPLOAD_KEY_PREFIX, Uuid::new_v4()),
            filename: filename.to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
            size_chars,
        };
        self.storage.set(&upload.key, &serde_json::to_string(&upload)?)?;
        Ok(UploadInfo::from(&upload))
    }

    /// Load a stored CSV. `key` may be given with or without the prefix.
    pub fn get(&self, key: &str) -> Result<CsvUpload> {
        let key = full_key(key);
        let raw = self.storage.get(&key)?.ok_or_else(|| {
            Error::not_found(
                "CSV upload not found. Please re-attach the file (uploads are stored only on this device).",
            )
        })?;
        decode(&key, &raw)
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.storage.remove(&full_key(key))
    }

    /// Every readable upload, newest first. Corrupted entries are skipped.
    pub fn list(&self) -> Result<Vec<UploadInfo>> {
        let mut uploads = Vec::new();
        for key in self.storage.keys(UPLOAD_KEY_PREFIX)? {
            if let Some(raw) = self.storage.get(&key)? {
                if let Ok(upload) = decode(&key, &raw) {
                    uploads.push(UploadInfo::from(&upload));
                }
            }
        }
        uploads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(uploads)
    }
}

fn full_key(key: &str) -> String {
    let key = key.trim();
    if key.starts_with(UPLOAD_KEY_PREFIX) {
        key.to_string()
    } else {
        format!("{}{}", UPLOAD_KEY_PREFIX, key)
    }
}

fn decode(key: &str, raw: &str) -> Result<CsvUpload> {
    let corrupted = || Error::corrupted("CSV upload is corrupted. Please re-attach the file.");
    let parsed: RawUpload = serde_json::from_str(raw).map_err(|_| corrupted())?;

    let text = parsed.text.filter(|t| !t.is_empty()).ok_or_else(corrupted)?;
    let filename = parsed.filename.filter(|f| !f.is_empty()).ok_or_else(corrupted)?;
    let size_chars = parsed.size_chars.unwrap_or_else(|| text.chars().count());

    Ok(CsvUpload {
        key: parsed.key.unwrap_or_else(|| key.to_string()),
        filename,
        text,
        created_at: parsed.created_at.unwrap_or_default(),
        size_chars,
    })
}
