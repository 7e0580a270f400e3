use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Processing configuration sent to the worker fleet.
///
/// Field names are part of the worker wire contract and must not change.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AudioProcessingConfig {
    pub target_lufs: f64,
    pub generate_formats: Vec<String>,
    pub quality_enhancement: bool,
    pub preserve_dynamic_range: bool,
    pub processing_intensity: String,
    pub validate_only: bool,
}

impl Default for AudioProcessingConfig {
    fn default() -> Self {
        Self {
            target_lufs: -14.0,
            generate_formats: vec!["mp3_320".to_string(), "flac_cd".to_string()],
            quality_enhancement: true,
            preserve_dynamic_range: true,
            processing_intensity: "standard".to_string(),
            validate_only: false,
        }
    }
}

/// Caller-supplied overrides applied on top of [`AudioProcessingConfig::default`].
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProcessingConfigOverrides {
    pub target_lufs: Option<f64>,
    #[serde(default)]
    pub generate_formats: Vec<String>,
    pub quality_enhancement: Option<bool>,
    pub preserve_dynamic_range: Option<bool>,
    #[serde(default)]
    pub processing_intensity: Option<String>,
}

impl ProcessingConfigOverrides {
    /// Merge the overrides into a config, field by field; absent fields keep
    /// their defaults.
    pub fn apply_to(&self, config: &mut AudioProcessingConfig) {
        if let Some(target_lufs) = self.target_lufs {
            config.target_lufs = target_lufs;
        }
        if !self.generate_formats.is_empty() {
            config.generate_formats = self.generate_formats.clone();
        }
        if let Some(quality_enhancement) = self.quality_enhancement {
            config.quality_enhancement = quality_enhancement;
        }
        if let Some(preserve_dynamic_range) = self.preserve_dynamic_range {
            config.preserve_dynamic_range = preserve_dynamic_range;
        }
        if let Some(ref intensity) = self.processing_intensity {
            if !intensity.is_empty() {
                config.processing_intensity = intensity.clone();
            }
        }
    }
}

/// Metadata passed through the queue to the worker (wire contract).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioProcessingMetadata {
    pub original_filename: String,
    pub file_size: i64,
    pub content_type: String,
    pub upload_session_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An asynchronous processing job for the external worker fleet.
///
/// Transient: it exists only as a queue message and a result-store entry.
/// Once submitted, this system keeps only the task ID to poll; resubmission
/// requires a new task ID.
#[derive(Debug, Clone)]
pub struct ProcessingJob {
    pub task_id: Uuid,
    pub song_id: Uuid,
    pub artist_id: Uuid,
    pub source_bucket: String,
    pub source_object_path: String,
    pub dest_bucket: String,
    pub config: AudioProcessingConfig,
    pub metadata: AudioProcessingMetadata,
    pub callback_url: Option<String>,
}

/// One generated output format, as reported by the worker.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProcessedFormat {
    pub format: String,
    pub object_path: String,
    pub file_size: i64,
    #[serde(default)]
    pub bitrate: Option<i32>,
    #[serde(default)]
    pub sample_rate: Option<i32>,
    #[serde(default)]
    pub bit_depth: Option<i32>,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub quality_score: f64,
}

/// Audio analysis measurements for a processed track (wire contract).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AudioAnalysisPayload {
    #[serde(default)]
    pub original_format: Option<String>,
    #[serde(default)]
    pub original_bitrate: Option<i32>,
    #[serde(default)]
    pub original_sample_rate: Option<i32>,
    #[serde(default)]
    pub original_bit_depth: Option<i32>,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub original_lufs: Option<f64>,
    #[serde(default)]
    pub processed_lufs: Option<f64>,
    #[serde(default)]
    pub dynamic_range: Option<f64>,
    #[serde(default)]
    pub peak_level: Option<f64>,
    #[serde(default)]
    pub true_peak: Option<f64>,
    #[serde(default)]
    pub spectral_centroid: Option<f64>,
    #[serde(default)]
    pub thd_plus_n: Option<f64>,
    #[serde(default)]
    pub stereo_width: Option<f64>,
    #[serde(default)]
    pub has_clipping: bool,
    #[serde(default)]
    pub has_artifacts: bool,
    #[serde(default)]
    pub quality_grade: Option<String>,
}

/// Terminal result produced by a processing job, either decoded from the
/// result store or delivered through the callback endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AudioProcessingResult {
    #[serde(default)]
    pub song_id: Option<Uuid>,
    pub success: bool,
    #[serde(default)]
    pub processed_formats: Vec<ProcessedFormat>,
    #[serde(default)]
    pub audio_analysis: Option<AudioAnalysisPayload>,
    #[serde(default)]
    pub quality_score: f64,
    #[serde(default)]
    pub processing_time_seconds: f64,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Coarse progress stage surfaced to clients while a job runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Queued,
    Processing,
    Completed,
    Failed,
    Retrying,
}

/// Progress model derived from the broker-reported task status.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProcessingProgress {
    pub stage: JobStage,
    pub percentage: f64,
    pub current_step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<DateTime<Utc>>,
}

/// Response for the processing status endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProcessingStatusResponse {
    pub task_id: Uuid,
    pub status: String,
    pub progress: ProcessingProgress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AudioProcessingResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
