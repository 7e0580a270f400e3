//! Data models for the upload and processing pipeline, organized by domain.

mod processing;
mod song;
mod upload_session;

pub use processing::*;
pub use song::*;
pub use upload_session::*;
