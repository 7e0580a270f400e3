//! Store traits the upload service and result reconciler depend on.
//!
//! Object-safe so tests can substitute in-memory implementations for the
//! Postgres repositories.

use async_trait::async_trait;
use uuid::Uuid;

use audora_core::models::{
    AudioAnalysisPayload, NewSong, ProcessedFormat, ProcessingStatus, Song, UploadSession,
};
use audora_core::AppError;

/// Persistence for upload sessions.
#[async_trait]
pub trait UploadSessionStore: Send + Sync {
    async fn create(&self, session: &UploadSession) -> Result<(), AppError>;

    async fn get(&self, id: &str) -> Result<Option<UploadSession>, AppError>;

    /// Atomically transition a session from `initiated` to `completed`,
    /// recording the song and task IDs minted for it. Returns false when the
    /// session was not in `initiated` state, in which case nothing changed.
    async fn complete(&self, id: &str, song_id: Uuid, task_id: Uuid) -> Result<bool, AppError>;
}

/// Persistence for the processing-relevant part of songs.
#[async_trait]
pub trait SongStore: Send + Sync {
    async fn create(&self, song: &NewSong) -> Result<Uuid, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Song>, AppError>;

    async fn processing_status(&self, id: Uuid) -> Result<Option<ProcessingStatus>, AppError>;

    async fn mark_processing_completed(
        &self,
        song_id: Uuid,
        duration_seconds: Option<i32>,
    ) -> Result<(), AppError>;

    async fn mark_processing_failed(&self, song_id: Uuid, error: &str) -> Result<(), AppError>;
}

/// Persistence for worker-produced formats and analysis.
#[async_trait]
pub trait AudioResultStore: Send + Sync {
    /// Insert all formats of one result in a single batch. Callers skip the
    /// call entirely for an empty result.
    async fn insert_formats(
        &self,
        song_id: Uuid,
        task_id: Uuid,
        formats: &[ProcessedFormat],
    ) -> Result<(), AppError>;

    /// Insert the analysis row for a song. A second insert for the same song
    /// is rejected with `Conflict`; analysis rows are never overwritten.
    async fn insert_analysis(
        &self,
        song_id: Uuid,
        task_id: Uuid,
        analysis: &AudioAnalysisPayload,
    ) -> Result<(), AppError>;
}
