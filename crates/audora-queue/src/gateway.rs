//! Queue gateway: submit jobs, read results, revoke tasks.
//!
//! The `Broker` trait is the I/O seam; `RedisBroker` implements it for
//! production with LPUSH for queues and GET for result keys, matching the
//! Celery Redis transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use audora_core::constants::{TASK_MANAGEMENT_QUEUE, TASK_RESULT_PREFIX};
use audora_core::models::{AudioProcessingResult, ProcessingJob};
use audora_core::AppError;

use crate::envelope::encode_envelope;
use crate::status::TaskState;

/// Minimal broker operations the gateway needs.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Push a payload onto the head of a queue list.
    async fn push(&self, queue: &str, payload: String) -> Result<(), AppError>;

    /// Read a key from the result store. `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
}

/// Redis-backed broker over a multiplexed connection manager.
#[derive(Clone)]
pub struct RedisBroker {
    conn: ConnectionManager,
}

impl RedisBroker {
    pub async fn new(redis_url: &str) -> Result<Self, AppError> {
        info!("Connecting to Redis broker at {}", redis_url);

        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Queue(format!("Failed to create Redis client: {e}")))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Queue(format!("Failed to connect to Redis: {e}")))?;

        info!("Successfully connected to Redis broker");

        Ok(Self { conn })
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn push(&self, queue: &str, payload: String) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(queue, payload)
            .await
            .map_err(|e| AppError::Queue(format!("Redis LPUSH failed: {e}")))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.clone();
        conn.get(key)
            .await
            .map_err(|e| AppError::Queue(format!("Redis GET failed: {e}")))
    }
}

/// A task's state as stored by the worker fleet in the result store.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskResult {
    #[serde(default)]
    pub task_id: String,
    pub status: String,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub traceback: Option<String>,
    #[serde(default)]
    pub children: Vec<Value>,
    #[serde(default)]
    pub date_done: Option<String>,
}

impl TaskResult {
    fn pending(task_id: Uuid) -> Self {
        TaskResult {
            task_id: task_id.to_string(),
            status: "PENDING".to_string(),
            result: Value::Null,
            traceback: None,
            children: Vec::new(),
            date_done: None,
        }
    }
}

/// Gateway to the worker fleet's queue and result store.
#[derive(Clone)]
pub struct QueueGateway {
    broker: Arc<dyn Broker>,
    queue: String,
    poll_interval: Duration,
}

impl QueueGateway {
    pub fn new(broker: Arc<dyn Broker>, queue: String, poll_interval: Duration) -> Self {
        Self {
            broker,
            queue,
            poll_interval,
        }
    }

    /// Encode and enqueue a processing job. The task ID is caller-assigned;
    /// a failed submit leaves no trace in the queue and may be retried with
    /// the same ID.
    pub async fn submit(&self, job: &ProcessingJob) -> Result<(), AppError> {
        let payload = encode_envelope(job, &self.queue)?;
        self.broker.push(&self.queue, payload).await?;

        info!(
            task_id = %job.task_id,
            song_id = %job.song_id,
            queue = %self.queue,
            "Submitted audio processing job"
        );

        Ok(())
    }

    /// Fetch the current result entry for a task. An absent result key means
    /// the task has not been picked up yet and reads as PENDING, never as an
    /// error.
    pub async fn fetch_result(&self, task_id: Uuid) -> Result<TaskResult, AppError> {
        let key = format!("{}{}", TASK_RESULT_PREFIX, task_id);

        match self.broker.get(&key).await? {
            Some(json) => {
                debug!(task_id = %task_id, "Task result present");
                serde_json::from_str(&json)
                    .map_err(|e| AppError::Queue(format!("Malformed task result: {e}")))
            }
            None => {
                debug!(task_id = %task_id, "Task result absent, reporting PENDING");
                Ok(TaskResult::pending(task_id))
            }
        }
    }

    /// Poll the result store until the task settles or the timeout elapses.
    /// The returned future is cancel-safe; dropping it stops the polling.
    pub async fn wait_for_result(
        &self,
        task_id: Uuid,
        timeout: Duration,
    ) -> Result<TaskResult, AppError> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let result = self.fetch_result(task_id).await?;

            let settled = match TaskState::parse(&result.status) {
                Ok(state) => state.is_settled(),
                // An unknown status will never settle here; hand it back.
                Err(_) => true,
            };
            if settled {
                return Ok(result);
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(AppError::Timeout(format!(
                    "Task {} did not complete within {:?}",
                    task_id, timeout
                )));
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Publish a best-effort revoke message to the management queue. Workers
    /// that already finished the task ignore it.
    pub async fn revoke(&self, task_id: Uuid, terminate: bool) -> Result<(), AppError> {
        let message = serde_json::json!({
            "method": "revoke",
            "arguments": {
                "task_id": task_id.to_string(),
                "terminate": terminate,
                "signal": "SIGTERM",
            },
        });

        self.broker
            .push(TASK_MANAGEMENT_QUEUE, message.to_string())
            .await?;

        warn!(task_id = %task_id, terminate, "Revoke requested for processing task");

        Ok(())
    }

    /// Decode the worker payload out of a SUCCESS result entry.
    pub fn decode_processing_result(
        &self,
        result: &TaskResult,
    ) -> Result<AudioProcessingResult, AppError> {
        if TaskState::parse(&result.status)? != TaskState::Success {
            return Err(AppError::Queue(format!(
                "Cannot decode processing result from status {}",
                result.status
            )));
        }

        serde_json::from_value(result.result.clone())
            .map_err(|e| AppError::Queue(format!("Malformed processing result payload: {e}")))
    }
}
