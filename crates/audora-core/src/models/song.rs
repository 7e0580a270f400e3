use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Processing state of a song's uploaded master.
///
/// Mutated only by the result reconciler after the initial `pending` state
/// set at upload completion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    /// Whether a job result may still be applied to a song in this state.
    pub fn accepts_result(&self) -> bool {
        matches!(self, ProcessingStatus::Pending | ProcessingStatus::Processing)
    }
}

impl Display for ProcessingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ProcessingStatus::Pending => write!(f, "pending"),
            ProcessingStatus::Processing => write!(f, "processing"),
            ProcessingStatus::Completed => write!(f, "completed"),
            ProcessingStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ProcessingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProcessingStatus::Pending),
            "processing" => Ok(ProcessingStatus::Processing),
            "completed" => Ok(ProcessingStatus::Completed),
            "failed" => Ok(ProcessingStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid processing status: {}", s)),
        }
    }
}

/// Processing-relevant projection of a song row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Song {
    pub id: Uuid,
    pub artist_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub genre_id: Option<Uuid>,
    pub mood_id: Option<Uuid>,
    pub file_url: String,
    pub file_size_bytes: Option<i64>,
    /// Set from the analysis payload once processing completes
    pub duration_seconds: Option<i32>,
    pub is_processed: bool,
    pub processing_status: ProcessingStatus,
    pub processing_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a song record at upload completion.
/// The ID is generated by the caller so the session's compare-and-set
/// transition can record it before the row exists.
#[derive(Debug, Clone)]
pub struct NewSong {
    pub id: Uuid,
    pub artist_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub genre_id: Option<Uuid>,
    pub mood_id: Option<Uuid>,
    pub file_url: String,
    pub file_size_bytes: i64,
}
