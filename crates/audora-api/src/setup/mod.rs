//! Application setup and initialization
//!
//! All initialization logic lives here rather than in main.rs: config
//! validation, telemetry, database, storage, queue, services, routes.

pub mod database;
pub mod queue;
pub mod routes;
pub mod server;
pub mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};

use audora_core::Config;
use audora_db::{AudioResultRepository, SongRepository, UploadSessionRepository};

use crate::services::reconciler::ResultReconciler;
use crate::services::upload::UploadService;
use crate::state::AppState;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry();
    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;
    let storage = storage::setup_storage(&config).await?;
    let queue = queue::setup_queue(&config).await?;

    let sessions = Arc::new(UploadSessionRepository::new(pool.clone()));
    let songs = Arc::new(SongRepository::new(pool.clone()));
    let results = Arc::new(AudioResultRepository::new(pool.clone()));

    let uploads = UploadService::new(
        sessions,
        songs.clone(),
        storage,
        queue.clone(),
        config.clone(),
    );
    let reconciler = ResultReconciler::new(songs, results);

    let state = Arc::new(AppState {
        config: config.clone(),
        pool,
        uploads,
        reconciler,
        queue,
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
