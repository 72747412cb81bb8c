//! Domain models and API response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of a processing job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// In-memory record of one upload's trip through the pipeline
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: Uuid,
    pub status: JobStatus,
    pub original_filename: String,
    /// Name of the processed artifact in the outgoing directory, once completed
    pub output_name: Option<String>,
    pub error: Option<String>,
    pub error_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn queued(id: Uuid, original_filename: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: JobStatus::Queued,
            original_filename: original_filename.into(),
            output_name: None,
            error: None,
            error_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Response for a synchronous upload that finished processing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub job_id: Uuid,
    /// Relative URL that streams the processed video
    pub download_url: String,
    pub message: String,
}

/// Response for an upload accepted into the background queue
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobAcceptedResponse {
    pub success: bool,
    pub job_id: Uuid,
    pub status: JobStatus,
    /// Relative URL to poll for the job's status
    pub status_url: String,
}

/// Status of a background job
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub original_filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Relative download URL for a processed artifact
pub fn download_url(output_name: &str) -> String {
    format!("/download/{}", output_name)
}

impl From<&JobRecord> for JobStatusResponse {
    fn from(record: &JobRecord) -> Self {
        Self {
            job_id: record.id,
            status: record.status,
            original_filename: record.original_filename.clone(),
            download_url: record.output_name.as_deref().map(download_url),
            error: record.error.clone(),
            code: record.error_code.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
