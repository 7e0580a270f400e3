use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::ProcessingConfigOverrides;

/// Lifecycle of an upload session.
///
/// `initiated` sessions past their expiry are logically dead; the transition
/// is enforced at completion time, not by a background sweep.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum UploadSessionStatus {
    Initiated,
    Completed,
    Expired,
}

impl Display for UploadSessionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadSessionStatus::Initiated => write!(f, "initiated"),
            UploadSessionStatus::Completed => write!(f, "completed"),
            UploadSessionStatus::Expired => write!(f, "expired"),
        }
    }
}

impl FromStr for UploadSessionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initiated" => Ok(UploadSessionStatus::Initiated),
            "completed" => Ok(UploadSessionStatus::Completed),
            "expired" => Ok(UploadSessionStatus::Expired),
            _ => Err(anyhow::anyhow!("Invalid upload session status: {}", s)),
        }
    }
}

/// A short-lived record tracking a single client-initiated transfer from
/// credential issuance to confirmed storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UploadSession {
    /// Opaque caller-visible ID, derived from artist, timestamp and filename.
    pub id: String,
    pub artist_id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub file_size: i64,
    pub object_path: String,
    pub status: UploadSessionStatus,
    pub expires_at: DateTime<Utc>,
    /// Set when the session completes, so a duplicate completion can report
    /// the original identifiers instead of creating new state.
    pub song_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UploadSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == UploadSessionStatus::Initiated && now > self.expires_at
    }
}

/// Request to start a direct-to-storage upload
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct InitiateUploadRequest {
    /// Original filename, extension decides format acceptance
    #[validate(length(
        min = 1,
        max = 255,
        message = "Filename must be between 1 and 255 characters"
    ))]
    pub filename: String,
    /// Declared file size in bytes
    pub file_size: i64,
    /// Content type (MIME type)
    #[validate(length(
        min = 1,
        max = 255,
        message = "Content type must be between 1 and 255 characters"
    ))]
    pub content_type: String,
    /// Artist the track belongs to
    pub artist_id: Uuid,
}

/// Instructions for using the presigned credential
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadInstructions {
    pub method: String,
    pub headers: HashMap<String, String>,
    pub callback_url: String,
}

/// Response containing the presigned upload credential
#[derive(Debug, Serialize, ToSchema)]
pub struct InitiateUploadResponse {
    /// Session ID (used to complete the upload)
    pub upload_id: String,
    /// Presigned URL for direct upload to object storage
    pub upload_url: String,
    /// Credential and session expiry
    pub expires_at: DateTime<Utc>,
    pub max_file_size: i64,
    pub instructions: UploadInstructions,
}

/// Request to confirm a finished upload and attach song metadata
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CompleteUploadRequest {
    pub upload_id: String,
    /// URL the client uploaded to (informational; the session's object path is authoritative)
    pub file_url: String,
    /// Size the client observed after upload; checked against storage
    pub actual_size: i64,
    #[serde(default)]
    pub etag: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub genre_id: Option<Uuid>,
    pub mood_id: Option<Uuid>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub processing_config: Option<ProcessingConfigOverrides>,
}

/// Response after completing an upload: the created song plus the handle for
/// tracking the asynchronous processing job.
#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteUploadResponse {
    pub song_id: Uuid,
    pub status: String,
    pub message: String,
    pub processing_task_id: Uuid,
    pub estimated_completion: DateTime<Utc>,
    pub tracking_url: String,
}

/// Read-only session snapshot
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadStatusResponse {
    pub upload_id: String,
    pub status: UploadSessionStatus,
    pub expires_at: DateTime<Utc>,
    pub filename: String,
    pub file_size: i64,
}
