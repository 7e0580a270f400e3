//! Object storage setup

use std::sync::Arc;

use anyhow::Result;

use audora_core::Config;
use audora_storage::{S3Storage, Storage};

/// Build the S3 storage client for the tracks and processed buckets.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = S3Storage::new(
        config.tracks_bucket().to_string(),
        config.processed_bucket().to_string(),
        config.s3_region().to_string(),
        config.s3_endpoint().map(|s| s.to_string()),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to initialize S3 storage: {}", e))?;

    tracing::info!(
        tracks_bucket = %config.tracks_bucket(),
        processed_bucket = %config.processed_bucket(),
        region = %config.s3_region(),
        endpoint = ?config.s3_endpoint(),
        "Object storage initialized"
    );

    Ok(Arc::new(storage))
}
