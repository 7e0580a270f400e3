//! Postgres repositories implementing the store ports.
//!
//! All queries are dynamic sqlx to avoid requiring DATABASE_URL/sqlx prepare
//! at build time.

pub mod audio_result;
pub mod song;
pub mod upload_session;

pub use audio_result::AudioResultRepository;
pub use song::SongRepository;
pub use upload_session::UploadSessionRepository;
