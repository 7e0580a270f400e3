use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use audora_core::models::{AudioAnalysisPayload, ProcessedFormat};
use audora_core::AppError;

use crate::ports::AudioResultStore;

/// Repository for worker-produced formats and analysis rows
#[derive(Clone)]
pub struct AudioResultRepository {
    pool: PgPool,
}

impl AudioResultRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AudioResultStore for AudioResultRepository {
    async fn insert_formats(
        &self,
        song_id: Uuid,
        task_id: Uuid,
        formats: &[ProcessedFormat],
    ) -> Result<(), AppError> {
        // Single multi-row insert via UNNEST, one round trip per result.
        let names: Vec<&str> = formats.iter().map(|f| f.format.as_str()).collect();
        let paths: Vec<&str> = formats.iter().map(|f| f.object_path.as_str()).collect();
        let sizes: Vec<i64> = formats.iter().map(|f| f.file_size).collect();
        let bitrates: Vec<Option<i32>> = formats.iter().map(|f| f.bitrate).collect();
        let sample_rates: Vec<Option<i32>> = formats.iter().map(|f| f.sample_rate).collect();
        let bit_depths: Vec<Option<i32>> = formats.iter().map(|f| f.bit_depth).collect();
        let durations: Vec<f64> = formats.iter().map(|f| f.duration).collect();
        let scores: Vec<f64> = formats.iter().map(|f| f.quality_score).collect();

        sqlx::query(
            r#"
            INSERT INTO processed_audio_formats (
                song_id, task_id, format, object_path, file_size,
                bitrate, sample_rate, bit_depth, duration_seconds, quality_score
            )
            SELECT $1, $2, f.*
            FROM UNNEST(
                $3::text[], $4::text[], $5::bigint[],
                $6::int[], $7::int[], $8::int[], $9::float8[], $10::float8[]
            ) AS f(format, object_path, file_size, bitrate, sample_rate,
                   bit_depth, duration_seconds, quality_score)
            "#,
        )
        .bind(song_id)
        .bind(task_id)
        .bind(&names)
        .bind(&paths)
        .bind(&sizes)
        .bind(&bitrates)
        .bind(&sample_rates)
        .bind(&bit_depths)
        .bind(&durations)
        .bind(&scores)
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            song_id = %song_id,
            task_id = %task_id,
            count = formats.len(),
            "Inserted processed audio formats"
        );

        Ok(())
    }

    async fn insert_analysis(
        &self,
        song_id: Uuid,
        task_id: Uuid,
        analysis: &AudioAnalysisPayload,
    ) -> Result<(), AppError> {
        // At most one analysis row per song; a duplicate insert is rejected
        // rather than overwriting the first result.
        let result = sqlx::query(
            r#"
            INSERT INTO audio_analysis (
                song_id, task_id, original_format, original_bitrate,
                original_sample_rate, original_bit_depth, duration_seconds,
                original_lufs, processed_lufs, dynamic_range, peak_level,
                true_peak, spectral_centroid, thd_plus_n, stereo_width,
                has_clipping, has_artifacts, quality_grade
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18)
            ON CONFLICT (song_id) DO NOTHING
            "#,
        )
        .bind(song_id)
        .bind(task_id)
        .bind(&analysis.original_format)
        .bind(analysis.original_bitrate)
        .bind(analysis.original_sample_rate)
        .bind(analysis.original_bit_depth)
        .bind(analysis.duration)
        .bind(analysis.original_lufs)
        .bind(analysis.processed_lufs)
        .bind(analysis.dynamic_range)
        .bind(analysis.peak_level)
        .bind(analysis.true_peak)
        .bind(analysis.spectral_centroid)
        .bind(analysis.thd_plus_n)
        .bind(analysis.stereo_width)
        .bind(analysis.has_clipping)
        .bind(analysis.has_artifacts)
        .bind(&analysis.quality_grade)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "Audio analysis already recorded for song {}",
                song_id
            )));
        }

        Ok(())
    }
}
