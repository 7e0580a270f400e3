//! Result reconciler.
//!
//! Applies a job's terminal result to the database exactly once per job:
//! format and analysis rows for a success, a failure mark otherwise. Both
//! the result-store path and the callback path funnel through `apply`, so a
//! result that arrives twice is rejected by the status guard or the
//! analysis uniqueness constraint rather than writing duplicate rows.

use std::sync::Arc;

use uuid::Uuid;

use audora_core::models::AudioProcessingResult;
use audora_core::AppError;
use audora_db::{AudioResultStore, SongStore};

pub struct ResultReconciler {
    songs: Arc<dyn SongStore>,
    results: Arc<dyn AudioResultStore>,
}

impl ResultReconciler {
    pub fn new(songs: Arc<dyn SongStore>, results: Arc<dyn AudioResultStore>) -> Self {
        Self { songs, results }
    }

    /// Apply a terminal result to the song it belongs to.
    ///
    /// Returns `Conflict` when the song already carries a terminal outcome;
    /// callers that want idempotent semantics (the callback endpoint) map
    /// that to an already-applied response.
    pub async fn apply(
        &self,
        song_id: Uuid,
        task_id: Uuid,
        result: &AudioProcessingResult,
    ) -> Result<(), AppError> {
        let status = self
            .songs
            .processing_status(song_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Song {} not found", song_id)))?;

        if !status.accepts_result() {
            return Err(AppError::Conflict(format!(
                "Song {} already reconciled (status {})",
                song_id, status
            )));
        }

        if result.success {
            self.apply_success(song_id, task_id, result).await
        } else {
            let error = result
                .error
                .as_deref()
                .unwrap_or("Audio processing failed without error detail");
            self.songs.mark_processing_failed(song_id, error).await?;

            tracing::warn!(
                song_id = %song_id,
                task_id = %task_id,
                error = %error,
                "Processing job failed, song marked failed"
            );

            Ok(())
        }
    }

    async fn apply_success(
        &self,
        song_id: Uuid,
        task_id: Uuid,
        result: &AudioProcessingResult,
    ) -> Result<(), AppError> {
        if !result.processed_formats.is_empty() {
            self.results
                .insert_formats(song_id, task_id, &result.processed_formats)
                .await?;
        }

        // The unique analysis row doubles as the last line of defense
        // against a result applied twice.
        if let Some(ref analysis) = result.audio_analysis {
            self.results
                .insert_analysis(song_id, task_id, analysis)
                .await?;
        }

        let duration_seconds = result
            .audio_analysis
            .as_ref()
            .map(|a| a.duration.trunc() as i32);

        self.songs
            .mark_processing_completed(song_id, duration_seconds)
            .await?;

        tracing::info!(
            song_id = %song_id,
            task_id = %task_id,
            formats = result.processed_formats.len(),
            quality_score = result.quality_score,
            "Processing result reconciled"
        );

        Ok(())
    }
}
