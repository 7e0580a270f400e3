use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use audora_core::models::UploadSession;
use audora_core::AppError;

use crate::ports::UploadSessionStore;

/// Repository for upload sessions
#[derive(Clone)]
pub struct UploadSessionRepository {
    pool: PgPool,
}

impl UploadSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UploadSessionStore for UploadSessionRepository {
    async fn create(&self, session: &UploadSession) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO upload_sessions (
                id, artist_id, user_id, filename, file_size, object_path,
                status, expires_at, song_id, task_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&session.id)
        .bind(session.artist_id)
        .bind(session.user_id)
        .bind(&session.filename)
        .bind(session.file_size)
        .bind(&session.object_path)
        .bind(session.status)
        .bind(session.expires_at)
        .bind(session.song_id)
        .bind(session.task_id)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<UploadSession>, AppError> {
        let session = sqlx::query_as::<_, UploadSession>(
            r#"
            SELECT
                id, artist_id, user_id, filename, file_size, object_path,
                status, expires_at, song_id, task_id, created_at, updated_at
            FROM upload_sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn complete(&self, id: &str, song_id: Uuid, task_id: Uuid) -> Result<bool, AppError> {
        // Single-statement compare-and-set; concurrent completions race on
        // the status predicate and exactly one wins.
        let result = sqlx::query(
            r#"
            UPDATE upload_sessions
            SET status = 'completed', song_id = $2, task_id = $3, updated_at = NOW()
            WHERE id = $1 AND status = 'initiated'
            "#,
        )
        .bind(id)
        .bind(song_id)
        .bind(task_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
