//! HTTP handlers for the upload and processing endpoints.

pub mod processing;
pub mod upload;
