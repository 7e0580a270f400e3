//! Celery task envelope codec.
//!
//! Encodes a [`ProcessingJob`] into the message shape the Python workers
//! dequeue. The body is serialized first and embedded in the envelope as a
//! JSON *string*, exactly as Celery's Redis transport expects.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use audora_core::models::{AudioProcessingConfig, AudioProcessingMetadata, ProcessingJob};
use audora_core::AppError;

/// Task body carried inside the envelope.
#[derive(Debug, Serialize)]
pub struct CeleryTask<'a> {
    pub id: String,
    pub task: &'a str,
    pub args: [Value; 0],
    pub kwargs: TaskKwargs<'a>,
    pub retries: u32,
}

/// Keyword arguments for `audio_processor.process_track`.
#[derive(Debug, Serialize)]
pub struct TaskKwargs<'a> {
    pub song_id: Uuid,
    pub artist_id: Uuid,
    pub source_bucket: &'a str,
    pub source_object_path: &'a str,
    pub dest_bucket: &'a str,
    pub processing_config: &'a AudioProcessingConfig,
    pub metadata: &'a AudioProcessingMetadata,
    pub callback_url: &'a str,
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    body: String,
    #[serde(rename = "content-type")]
    content_type: &'a str,
    #[serde(rename = "content-encoding")]
    content_encoding: &'a str,
    headers: Headers<'a>,
    properties: Properties<'a>,
}

#[derive(Debug, Serialize)]
struct Headers<'a> {
    id: String,
    task: &'a str,
    lang: &'a str,
    root_id: String,
    parent_id: Option<String>,
    group: Option<String>,
    meth: &'a str,
    shadow: Option<String>,
    eta: Option<String>,
    expires: Option<String>,
    retries: u32,
    timelimit: [Option<u32>; 2],
    argsrepr: &'a str,
    kwargsrepr: String,
    origin: &'a str,
}

#[derive(Debug, Serialize)]
struct Properties<'a> {
    correlation_id: String,
    reply_to: String,
    delivery_mode: u8,
    delivery_info: DeliveryInfo<'a>,
}

#[derive(Debug, Serialize)]
struct DeliveryInfo<'a> {
    exchange: &'a str,
    routing_key: &'a str,
}

/// Encode a job into the full Celery envelope, ready for LPUSH.
pub fn encode_envelope(job: &ProcessingJob, queue: &str) -> Result<String, AppError> {
    let task_id = job.task_id.to_string();

    let kwargs = TaskKwargs {
        song_id: job.song_id,
        artist_id: job.artist_id,
        source_bucket: &job.source_bucket,
        source_object_path: &job.source_object_path,
        dest_bucket: &job.dest_bucket,
        processing_config: &job.config,
        metadata: &job.metadata,
        callback_url: job.callback_url.as_deref().unwrap_or(""),
    };

    // kwargsrepr is informational in Celery; the workers read the body.
    let kwargsrepr = serde_json::to_string(&kwargs)?;

    let task = CeleryTask {
        id: task_id.clone(),
        task: audora_core::constants::PROCESS_TRACK_TASK,
        args: [],
        kwargs,
        retries: 3,
    };

    let body = serde_json::to_string(&task)?;

    let envelope = Envelope {
        body,
        content_type: "application/json",
        content_encoding: "utf-8",
        headers: Headers {
            id: task_id.clone(),
            task: audora_core::constants::PROCESS_TRACK_TASK,
            lang: "py",
            root_id: task_id.clone(),
            parent_id: None,
            group: None,
            meth: "py",
            shadow: None,
            eta: None,
            expires: None,
            retries: 0,
            timelimit: [None, None],
            argsrepr: "[]",
            kwargsrepr,
            origin: "audora-api",
        },
        properties: Properties {
            correlation_id: task_id,
            reply_to: Uuid::new_v4().to_string(),
            delivery_mode: 2,
            delivery_info: DeliveryInfo {
                exchange: "",
                routing_key: queue,
            },
        },
    };

    Ok(serde_json::to_string(&envelope)?)
}
