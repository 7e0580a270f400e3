use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use audora_core::models::{AudioProcessingResult, ProcessingStatusResponse};
use audora_core::AppError;
use audora_queue::{status, TaskState};

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

/// Current processing state of a submitted job
///
/// Single non-blocking read of the result store; clients poll this endpoint
/// rather than the server holding the request open.
#[utoipa::path(
    get,
    path = "/api/v1/processing/status/{task_id}",
    tag = "processing",
    params(("task_id" = Uuid, Path, description = "Processing task ID")),
    responses(
        (status = 200, description = "Job status and progress", body = ProcessingStatusResponse),
        (status = 502, description = "Result store unreachable or malformed entry", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(task_id = %task_id, operation = "get_processing_status"))]
pub async fn get_processing_status(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let task_result = state.queue.fetch_result(task_id).await?;

    let (progress, unknown) = status::translate(
        &task_result.status,
        task_result.traceback.as_deref(),
    );
    if let Some(ref err) = unknown {
        tracing::error!(
            task_id = %task_id,
            status = %task_result.status,
            error = %err,
            "Broker reported a task status this service does not understand"
        );
    }

    let decoded = match TaskState::parse(&task_result.status) {
        Ok(TaskState::Success) => Some(state.queue.decode_processing_result(&task_result)?),
        _ => None,
    };

    let error = if let Some(err) = unknown {
        Some(err.to_string())
    } else {
        match TaskState::parse(&task_result.status) {
            Ok(TaskState::Failure) => Some(
                task_result
                    .traceback
                    .clone()
                    .unwrap_or_else(|| "Processing failed".to_string()),
            ),
            _ => None,
        }
    };

    Ok(Json(ProcessingStatusResponse {
        task_id,
        status: task_result.status,
        progress,
        result: decoded,
        error,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub task_id: Option<Uuid>,
}

/// Worker-initiated result delivery
///
/// Alternative to polling: the worker POSTs its terminal result here. The
/// endpoint is idempotent; a result that was already reconciled (through
/// either path) yields `already_applied` instead of an error.
#[utoipa::path(
    post,
    path = "/api/v1/processing/callback/{song_id}",
    tag = "processing",
    params(("song_id" = Uuid, Path, description = "Song the result belongs to")),
    request_body = AudioProcessingResult,
    responses(
        (status = 200, description = "Result applied or already applied"),
        (status = 404, description = "Unknown song", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, result),
    fields(song_id = %song_id, operation = "processing_callback")
)]
pub async fn processing_callback(
    State(state): State<Arc<AppState>>,
    Path(song_id): Path<Uuid>,
    Query(query): Query<CallbackQuery>,
    ValidatedJson(result): ValidatedJson<AudioProcessingResult>,
) -> Result<impl IntoResponse, HttpAppError> {
    let task_id = query.task_id.unwrap_or(Uuid::nil());

    match state.reconciler.apply(song_id, task_id, &result).await {
        Ok(()) => Ok(Json(serde_json::json!({ "status": "applied" }))),
        Err(AppError::Conflict(_)) => {
            tracing::debug!(song_id = %song_id, "Duplicate callback, result already applied");
            Ok(Json(serde_json::json!({ "status": "already_applied" })))
        }
        Err(err) => Err(err.into()),
    }
}
