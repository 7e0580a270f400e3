//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use audora_core::Config;
use audora_queue::QueueGateway;

use crate::services::reconciler::ResultReconciler;
use crate::services::upload::UploadService;

pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub uploads: UploadService,
    pub reconciler: ResultReconciler,
    pub queue: Arc<QueueGateway>,
}
