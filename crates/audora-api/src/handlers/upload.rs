use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use audora_core::models::{
    CompleteUploadRequest, CompleteUploadResponse, InitiateUploadRequest, InitiateUploadResponse,
    UploadStatusResponse,
};

use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

/// Start a direct-to-storage upload and receive a presigned credential
#[utoipa::path(
    post,
    path = "/api/v1/upload/initiate",
    tag = "upload",
    request_body = InitiateUploadRequest,
    responses(
        (status = 200, description = "Upload session created", body = InitiateUploadResponse),
        (status = 400, description = "Invalid filename or size", body = ErrorResponse),
        (status = 401, description = "Missing or invalid caller identity", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(user_id = %user.user_id, operation = "initiate_upload")
)]
pub async fn initiate_upload(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<InitiateUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = state
        .uploads
        .initiate_upload(request, user.user_id)
        .await?;
    Ok(Json(response))
}

/// Confirm a finished upload, create the song, and submit processing
#[utoipa::path(
    post,
    path = "/api/v1/upload/complete",
    tag = "upload",
    request_body = CompleteUploadRequest,
    responses(
        (status = 200, description = "Song created and processing started", body = CompleteUploadResponse),
        (status = 400, description = "Expired session or size mismatch", body = ErrorResponse),
        (status = 403, description = "Session owned by another user", body = ErrorResponse),
        (status = 404, description = "Unknown upload session", body = ErrorResponse),
        (status = 409, description = "Session already completed", body = ErrorResponse),
        (status = 502, description = "Job submission failed; retry", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(user_id = %user.user_id, upload_id = %request.upload_id, operation = "complete_upload")
)]
pub async fn complete_upload(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CompleteUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = state
        .uploads
        .complete_upload(request, user.user_id)
        .await?;
    Ok(Json(response))
}

/// Read-only upload session snapshot
#[utoipa::path(
    get,
    path = "/api/v1/upload/status/{upload_id}",
    tag = "upload",
    params(("upload_id" = String, Path, description = "Upload session ID")),
    responses(
        (status = 200, description = "Session snapshot", body = UploadStatusResponse),
        (status = 404, description = "Unknown upload session", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state),
    fields(user_id = %user.user_id, upload_id = %upload_id, operation = "get_upload_status")
)]
pub async fn get_upload_status(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    Path(upload_id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = state.uploads.get_upload_status(&upload_id).await?;
    Ok(Json(response))
}
