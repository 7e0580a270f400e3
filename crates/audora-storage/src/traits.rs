//! Storage abstraction trait
//!
//! Defines the credential-issuer interface the upload pipeline depends on.
//! The S3 backend implements it for production; tests substitute an
//! in-memory stub.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use audora_core::AppError;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::InvalidPath(msg) => AppError::InvalidInput(msg),
            StorageError::BackendError(msg) => AppError::Storage(msg),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        }
    }
}

/// Bucket class an object lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketClass {
    /// Uploaded masters, written directly by clients via presigned URLs
    Tracks,
    /// Worker-generated output formats
    Processed,
}

/// A time-limited, method-scoped credential for writing one object directly
/// to storage.
#[derive(Debug, Clone)]
pub struct PresignedUpload {
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub expires_at: DateTime<Utc>,
}

/// Metadata of a stored object.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub size: i64,
    pub etag: Option<String>,
}

/// Storage credential issuer and object inspector.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Generate a presigned PUT credential for a direct client upload.
    async fn presigned_upload_url(
        &self,
        bucket: BucketClass,
        object_path: &str,
        expires_in: Duration,
    ) -> StorageResult<PresignedUpload>;

    /// Fetch size and etag of a stored object. `NotFound` when absent.
    async fn file_info(&self, bucket: BucketClass, object_path: &str) -> StorageResult<FileInfo>;

    /// Check whether an object exists.
    async fn exists(&self, bucket: BucketClass, object_path: &str) -> StorageResult<bool>;
}
