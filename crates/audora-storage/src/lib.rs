//! Audora Storage Library
//!
//! Object-storage abstraction for the upload pipeline: issuing presigned
//! upload credentials and inspecting stored objects. The client uploads bytes
//! directly to storage; this service never proxies the transfer.
//!
//! # Object path format
//!
//! Paths for uploaded masters are deterministic:
//! `uploads/{artist_id}/{YYYYMMDD}/{sanitized_filename}.{ext}`.
//! Derivation is centralized in the `keys` module.

pub mod keys;
pub mod s3;
pub mod traits;

pub use s3::S3Storage;
pub use traits::{
    BucketClass, FileInfo, PresignedUpload, Storage, StorageError, StorageResult,
};
