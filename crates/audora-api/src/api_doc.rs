//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use audora_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Audora API",
        version = "0.1.0",
        description = "Upload session and audio-processing orchestration for the Audora music platform. Clients upload masters directly to object storage with presigned credentials; processing runs on an external worker fleet reached over Redis. All endpoints are versioned under /api/v1/."
    ),
    paths(
        handlers::upload::initiate_upload,
        handlers::upload::complete_upload,
        handlers::upload::get_upload_status,
        handlers::processing::get_processing_status,
        handlers::processing::processing_callback,
    ),
    components(schemas(
        models::InitiateUploadRequest,
        models::InitiateUploadResponse,
        models::UploadInstructions,
        models::CompleteUploadRequest,
        models::CompleteUploadResponse,
        models::UploadStatusResponse,
        models::UploadSessionStatus,
        models::ProcessingStatusResponse,
        models::ProcessingProgress,
        models::JobStage,
        models::AudioProcessingResult,
        models::AudioProcessingConfig,
        models::ProcessingConfigOverrides,
        models::ProcessedFormat,
        models::AudioAnalysisPayload,
        error::ErrorResponse,
    )),
    tags(
        (name = "upload", description = "Upload session lifecycle"),
        (name = "processing", description = "Audio processing job tracking and results")
    )
)]
pub struct ApiDoc;
