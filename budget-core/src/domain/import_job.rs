//! Import job audit records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportJobStatus {
    Preview,
    Running,
    Completed,
    Failed,
}

/// Audit record of one commit invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportJob {
    #[serde(rename = "import_job_id")]
    pub id: Uuid,
    pub upload_filename: String,
    pub status: ImportJobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<usize>,
    pub processed_rows: usize,
    pub failed_rows: usize,
    pub success_rows: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_summary: Option<String>,
}

impl ImportJob {
    /// A job that has just started processing `total_rows` rows
    pub fn running(id: Uuid, filename: impl Into<String>, total_rows: usize) -> Self {
        Self {
            id,
            upload_filename: filename.into(),
            status: ImportJobStatus::Running,
            started_at: Some(Utc::now()),
            finished_at: None,
            total_rows: Some(total_rows),
            processed_rows: 0,
            failed_rows: 0,
            success_rows: 0,
            error_summary: None,
        }
    }
}

/// Which CSV column fed which semantic field for a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportJobMapping {
    #[serde(rename = "import_job_mapping_id")]
    pub id: Uuid,
    pub import_job_id: Uuid,
    pub csv_column_name: String,
    pub target_field_name: String,
    pub mapping_type: MappingType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingType {
    Column,
    Fixed,
}

/// One failed row of a job, with the raw row payload for diagnosis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportJobError {
    #[serde(rename = "import_job_error_id")]
    pub id: Uuid,
    pub import_job_id: Uuid,
    pub row_number: usize,
    pub error_message: String,
    /// JSON array of the row's raw fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<String>,
}
