//! Route configuration and setup.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use audora_core::Config;

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;

/// Request bodies are JSON metadata only; the audio bytes themselves go
/// directly to object storage and never pass through this service.
const MAX_JSON_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    let api_routes = Router::new()
        .route(
            "/api/v1/upload/initiate",
            post(handlers::upload::initiate_upload),
        )
        .route(
            "/api/v1/upload/complete",
            post(handlers::upload::complete_upload),
        )
        .route(
            "/api/v1/upload/status/{upload_id}",
            get(handlers::upload::get_upload_status),
        )
        .route(
            "/api/v1/processing/status/{task_id}",
            get(handlers::processing::get_processing_status),
        )
        .route(
            "/api/v1/processing/callback/{song_id}",
            post(handlers::processing::processing_callback),
        )
        .route("/health/live", get(liveness_check))
        .route("/health/ready", get(readiness_check))
        .route("/api/openapi.json", get(openapi_spec))
        .with_state(state);

    let app = api_routes
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs")
                .into(),
        )
        .layer(RequestBodyLimitLayer::new(MAX_JSON_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins().iter().map(|o| o.parse()).collect();
        CorsLayer::new()
            .allow_origin(origins.unwrap_or_default())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}

async fn openapi_spec() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Liveness probe - process is running.
async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe - critical dependencies (database).
async fn readiness_check(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    match tokio::time::timeout(TIMEOUT, sqlx::query("SELECT 1").execute(&state.pool)).await {
        Ok(Ok(_)) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ready", "database": "ready" })),
        ),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Database readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "not_ready",
                    "database": format!("not_ready: {}", e),
                })),
            )
        }
        Err(_) => {
            tracing::error!("Database readiness check timed out");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "not_ready", "database": "timeout" })),
            )
        }
    }
}
