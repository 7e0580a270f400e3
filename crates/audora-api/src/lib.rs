//! Audora API Library
//!
//! HTTP surface and orchestration services for the upload and audio
//! processing pipeline: handlers, the upload session service, the result
//! reconciler, and application setup.

mod api_doc;
pub mod auth;
pub mod error;
mod handlers;
pub mod services;
pub mod setup;
pub mod state;
mod telemetry;

pub use error::ErrorResponse;
pub use services::reconciler::ResultReconciler;
pub use services::upload::UploadService;
