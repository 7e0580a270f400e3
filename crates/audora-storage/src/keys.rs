//! Deterministic derivation of object paths and upload session IDs.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use audora_core::validation::sanitize_filename;

/// Derive the object path for an uploaded master.
///
/// The path is deterministic from artist, day-granularity timestamp, and
/// sanitized filename. Two uploads by the same artist on the same day with
/// the same filename therefore collide; callers accept last-write-wins for
/// that rare case rather than adding a collision check.
pub fn upload_object_path(artist_id: Uuid, now: DateTime<Utc>, filename: &str) -> String {
    let day = now.format("%Y%m%d");
    let stem = sanitize_filename(filename);
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_else(|| "bin".to_string());
    format!("uploads/{}/{}/{}.{}", artist_id, day, stem, extension)
}

/// Derive an opaque upload session ID from artist, second-granularity
/// timestamp, and sanitized filename.
pub fn upload_session_id(artist_id: Uuid, now: DateTime<Utc>, filename: &str) -> String {
    format!(
        "upload_{}_{}_{}",
        artist_id,
        now.timestamp(),
        sanitize_filename(filename)
    )
}
