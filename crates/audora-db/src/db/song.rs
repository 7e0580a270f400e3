use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use audora_core::models::{NewSong, ProcessingStatus, Song};
use audora_core::AppError;

use crate::ports::SongStore;

/// Repository for the processing-relevant projection of songs
#[derive(Clone)]
pub struct SongRepository {
    pool: PgPool,
}

impl SongRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SongStore for SongRepository {
    async fn create(&self, song: &NewSong) -> Result<Uuid, AppError> {
        sqlx::query(
            r#"
            INSERT INTO songs (
                id, artist_id, title, description, genre_id, mood_id,
                file_url, file_size_bytes, is_processed, processing_status,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE, 'pending', NOW(), NOW())
            "#,
        )
        .bind(song.id)
        .bind(song.artist_id)
        .bind(&song.title)
        .bind(&song.description)
        .bind(song.genre_id)
        .bind(song.mood_id)
        .bind(&song.file_url)
        .bind(song.file_size_bytes)
        .execute(&self.pool)
        .await?;

        Ok(song.id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Song>, AppError> {
        let song = sqlx::query_as::<_, Song>(
            r#"
            SELECT
                id, artist_id, title, description, genre_id, mood_id,
                file_url, file_size_bytes, duration_seconds, is_processed,
                processing_status, processing_error, created_at, updated_at
            FROM songs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(song)
    }

    async fn processing_status(&self, id: Uuid) -> Result<Option<ProcessingStatus>, AppError> {
        let status = sqlx::query_scalar::<_, ProcessingStatus>(
            "SELECT processing_status FROM songs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(status)
    }

    async fn mark_processing_completed(
        &self,
        song_id: Uuid,
        duration_seconds: Option<i32>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE songs
            SET processing_status = 'completed',
                is_processed = TRUE,
                duration_seconds = COALESCE($2, duration_seconds),
                processing_error = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(song_id)
        .bind(duration_seconds)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_processing_failed(&self, song_id: Uuid, error: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE songs
            SET processing_status = 'failed',
                processing_error = $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(song_id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
