//! Audora Database Library
//!
//! Persistence layer for the upload and processing pipeline. The `ports`
//! module defines the store traits the services depend on; `db` holds the
//! Postgres repositories implementing them with dynamic sqlx queries.

pub mod db;
pub mod ports;

pub use db::{AudioResultRepository, SongRepository, UploadSessionRepository};
pub use ports::{AudioResultStore, SongStore, UploadSessionStore};
