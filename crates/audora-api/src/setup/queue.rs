//! Redis broker and queue gateway setup

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use audora_core::Config;
use audora_queue::{QueueGateway, RedisBroker};

/// Connect to Redis and build the queue gateway.
pub async fn setup_queue(config: &Config) -> Result<Arc<QueueGateway>> {
    let broker = RedisBroker::new(config.redis_url())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to Redis broker: {}", e))?;

    let gateway = QueueGateway::new(
        Arc::new(broker),
        config.processing_queue().to_string(),
        Duration::from_secs(config.result_poll_interval_secs()),
    );

    tracing::info!(
        queue = %config.processing_queue(),
        poll_interval_secs = config.result_poll_interval_secs(),
        "Queue gateway initialized"
    );

    Ok(Arc::new(gateway))
}
