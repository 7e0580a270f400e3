use crate::traits::{
    BucketClass, FileInfo, PresignedUpload, Storage, StorageError, StorageResult,
};
use async_trait::async_trait;
use chrono::Utc;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::ObjectStoreExt;
use std::collections::HashMap;
use std::time::Duration;

/// S3 storage implementation
///
/// Holds one object store handle per bucket class. Works against AWS S3 or
/// any S3-compatible provider (MinIO, DigitalOcean Spaces) via a custom
/// endpoint.
#[derive(Clone)]
pub struct S3Storage {
    tracks: AmazonS3,
    processed: AmazonS3,
    tracks_bucket: String,
    processed_bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `tracks_bucket` - bucket that receives uploaded masters
    /// * `processed_bucket` - bucket the worker writes output formats to
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        tracks_bucket: String,
        processed_bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let tracks = Self::build_store(&tracks_bucket, &region, endpoint_url.as_deref())?;
        let processed = Self::build_store(&processed_bucket, &region, endpoint_url.as_deref())?;

        Ok(S3Storage {
            tracks,
            processed,
            tracks_bucket,
            processed_bucket,
        })
    }

    fn build_store(
        bucket: &str,
        region: &str,
        endpoint_url: Option<&str>,
    ) -> StorageResult<AmazonS3> {
        // Build AmazonS3 object store from environment and explicit settings.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.to_string())
            .with_bucket_name(bucket.to_string());

        if let Some(endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.to_string())
                .with_allow_http(allow_http);
        }

        builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }

    fn store_for(&self, bucket: BucketClass) -> (&AmazonS3, &str) {
        match bucket {
            BucketClass::Tracks => (&self.tracks, self.tracks_bucket.as_str()),
            BucketClass::Processed => (&self.processed, self.processed_bucket.as_str()),
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn presigned_upload_url(
        &self,
        bucket: BucketClass,
        object_path: &str,
        expires_in: Duration,
    ) -> StorageResult<PresignedUpload> {
        let (store, bucket_name) = self.store_for(bucket);
        let location = Path::from(object_path.to_string());
        let start = std::time::Instant::now();

        let url = store
            .signed_url(Method::PUT, &location, expires_in)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %bucket_name,
                    key = %object_path,
                    "S3 presign failed"
                );
                StorageError::BackendError(e.to_string())
            })?;

        tracing::info!(
            bucket = %bucket_name,
            key = %object_path,
            expires_in_secs = expires_in.as_secs(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 presign successful"
        );

        let mut headers = HashMap::new();
        headers.insert(
            "Content-Type".to_string(),
            "application/octet-stream".to_string(),
        );

        Ok(PresignedUpload {
            url: url.to_string(),
            method: "PUT".to_string(),
            headers,
            expires_at: Utc::now()
                + chrono::Duration::seconds(expires_in.as_secs() as i64),
        })
    }

    async fn file_info(&self, bucket: BucketClass, object_path: &str) -> StorageResult<FileInfo> {
        let (store, bucket_name) = self.store_for(bucket);
        let location = Path::from(object_path.to_string());

        let meta = store.head(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(object_path.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %bucket_name,
                    key = %object_path,
                    "S3 head failed"
                );
                StorageError::BackendError(other.to_string())
            }
        })?;

        Ok(FileInfo {
            size: meta.size as i64,
            etag: meta.e_tag,
        })
    }

    async fn exists(&self, bucket: BucketClass, object_path: &str) -> StorageResult<bool> {
        let (store, _) = self.store_for(bucket);
        let location = Path::from(object_path.to_string());
        match store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }
}
