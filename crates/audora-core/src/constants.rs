//! Shared constants for the upload and processing pipeline.

/// Maximum declared size for an uploaded master, in bytes (600 MiB).
pub const MAX_UPLOAD_SIZE_BYTES: i64 = 600 * 1024 * 1024;

/// How long an upload credential and its session stay valid.
pub const UPLOAD_SESSION_TTL_MINUTES: i64 = 15;

/// Audio container formats accepted for upload (lowercase, no leading dot).
pub const ALLOWED_AUDIO_EXTENSIONS: &[&str] = &["flac", "wav", "aiff", "mp3"];

/// Task name the external worker fleet registers for track processing.
pub const PROCESS_TRACK_TASK: &str = "audio_processor.process_track";

/// Work queue the external worker fleet consumes.
pub const AUDIO_PROCESSING_QUEUE: &str = "audio_processing";

/// Key prefix under which the worker fleet stores task results.
pub const TASK_RESULT_PREFIX: &str = "celery-task-meta-";

/// Management queue for best-effort task revocation.
pub const TASK_MANAGEMENT_QUEUE: &str = "celeryev.management";
