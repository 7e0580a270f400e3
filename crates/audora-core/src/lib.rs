//! Audora Core Library
//!
//! This crate provides the domain models, error types, configuration, and
//! validation shared across the Audora upload and audio-processing services.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
