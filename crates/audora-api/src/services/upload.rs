//! Upload session manager.
//!
//! Owns the session lifecycle from credential issuance to job submission.
//! Completion uses an at-most-once protocol: song and task IDs are minted
//! before the session's compare-and-set transition to `completed`, so the
//! single winner creates the song and submits the job, and every loser sees
//! a conflict carrying the winner's identifiers.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use audora_core::models::{
    AudioProcessingConfig, AudioProcessingMetadata, CompleteUploadRequest, CompleteUploadResponse,
    InitiateUploadRequest, InitiateUploadResponse, NewSong, ProcessingJob, UploadInstructions,
    UploadSession, UploadSessionStatus, UploadStatusResponse,
};
use audora_core::validation::{
    content_type_for_filename, validate_audio_filename, validate_declared_size,
};
use audora_core::{AppError, Config};
use audora_db::{SongStore, UploadSessionStore};
use audora_queue::QueueGateway;
use audora_storage::{keys, BucketClass, Storage, StorageError};

/// Processing typically finishes well inside this window; surfaced to
/// clients as the estimated completion time.
const ESTIMATED_PROCESSING_MINUTES: i64 = 8;

pub struct UploadService {
    sessions: Arc<dyn UploadSessionStore>,
    songs: Arc<dyn SongStore>,
    storage: Arc<dyn Storage>,
    queue: Arc<QueueGateway>,
    config: Config,
}

impl UploadService {
    pub fn new(
        sessions: Arc<dyn UploadSessionStore>,
        songs: Arc<dyn SongStore>,
        storage: Arc<dyn Storage>,
        queue: Arc<QueueGateway>,
        config: Config,
    ) -> Self {
        Self {
            sessions,
            songs,
            storage,
            queue,
            config,
        }
    }

    /// Validate the request, issue a presigned PUT credential, and persist
    /// an `initiated` session expiring with the credential.
    pub async fn initiate_upload(
        &self,
        request: InitiateUploadRequest,
        user_id: Uuid,
    ) -> Result<InitiateUploadResponse, AppError> {
        request.validate()?;
        validate_audio_filename(&request.filename, self.config.allowed_audio_extensions())?;
        validate_declared_size(request.file_size, self.config.max_upload_size_bytes())?;

        let now = Utc::now();
        let ttl_minutes = self.config.upload_session_ttl_minutes();
        let expires_at = now + Duration::minutes(ttl_minutes);

        let object_path = keys::upload_object_path(request.artist_id, now, &request.filename);
        let session_id = keys::upload_session_id(request.artist_id, now, &request.filename);

        let presigned = self
            .storage
            .presigned_upload_url(
                BucketClass::Tracks,
                &object_path,
                StdDuration::from_secs(ttl_minutes as u64 * 60),
            )
            .await?;

        let session = UploadSession {
            id: session_id.clone(),
            artist_id: request.artist_id,
            user_id,
            filename: request.filename.clone(),
            file_size: request.file_size,
            object_path,
            status: UploadSessionStatus::Initiated,
            expires_at,
            song_id: None,
            task_id: None,
            created_at: now,
            updated_at: now,
        };
        self.sessions.create(&session).await?;

        tracing::info!(
            upload_id = %session_id,
            artist_id = %request.artist_id,
            filename = %request.filename,
            file_size = request.file_size,
            "Upload session initiated"
        );

        Ok(InitiateUploadResponse {
            upload_id: session_id,
            upload_url: presigned.url,
            expires_at,
            max_file_size: self.config.max_upload_size_bytes(),
            instructions: UploadInstructions {
                method: presigned.method,
                headers: presigned.headers,
                callback_url: format!("{}/api/v1/upload/complete", self.config.public_base_url()),
            },
        })
    }

    /// Confirm a finished upload: verify ownership, expiry and stored size,
    /// then run the at-most-once completion protocol.
    pub async fn complete_upload(
        &self,
        request: CompleteUploadRequest,
        user_id: Uuid,
    ) -> Result<CompleteUploadResponse, AppError> {
        request.validate()?;

        let session = self
            .sessions
            .get(&request.upload_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Upload session {} not found", request.upload_id))
            })?;

        if session.user_id != user_id {
            return Err(AppError::Forbidden(
                "Upload session belongs to another user".to_string(),
            ));
        }

        let now = Utc::now();
        if session.is_expired(now) {
            return Err(AppError::InvalidInput(format!(
                "Upload session {} expired at {}",
                session.id, session.expires_at
            )));
        }

        if session.status == UploadSessionStatus::Completed {
            return Err(already_completed(&session));
        }

        // Verify the object actually landed in storage before any state
        // change; a mismatch leaves the session untouched.
        let info = self
            .storage
            .file_info(BucketClass::Tracks, &session.object_path)
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => AppError::InvalidInput(format!(
                    "No uploaded object found at {}; upload the file before completing",
                    session.object_path
                )),
                other => other.into(),
            })?;

        if info.size != request.actual_size {
            return Err(AppError::SizeMismatch {
                reported: request.actual_size,
                actual: info.size,
            });
        }

        // Mint identifiers first so the compare-and-set below records them
        // atomically with the status transition.
        let song_id = Uuid::new_v4();
        let task_id = Uuid::new_v4();

        let won = self
            .sessions
            .complete(&session.id, song_id, task_id)
            .await?;
        if !won {
            // Concurrent completion won the race; report its identifiers.
            let current = self.sessions.get(&session.id).await?;
            return Err(match current {
                Some(ref s) if s.status == UploadSessionStatus::Completed => already_completed(s),
                _ => AppError::Conflict(format!(
                    "Upload session {} is no longer completable",
                    session.id
                )),
            });
        }

        let song = NewSong {
            id: song_id,
            artist_id: session.artist_id,
            title: request.title.clone(),
            description: request.description.clone(),
            genre_id: request.genre_id,
            mood_id: request.mood_id,
            file_url: request.file_url.clone(),
            file_size_bytes: info.size,
        };
        self.songs.create(&song).await?;

        let mut config = AudioProcessingConfig::default();
        if let Some(ref overrides) = request.processing_config {
            overrides.apply_to(&mut config);
        }

        let job = ProcessingJob {
            task_id,
            song_id,
            artist_id: session.artist_id,
            source_bucket: self.config.tracks_bucket().to_string(),
            source_object_path: session.object_path.clone(),
            dest_bucket: self.config.processed_bucket().to_string(),
            config,
            metadata: AudioProcessingMetadata {
                original_filename: session.filename.clone(),
                file_size: info.size,
                content_type: content_type_for_filename(&session.filename).to_string(),
                upload_session_id: session.id.clone(),
                title: request.title.clone(),
                genre_id: request.genre_id,
                mood_id: request.mood_id,
                description: request.description.clone(),
            },
            // task_id travels in the query so the callback can attribute
            // result rows to the job that produced them
            callback_url: Some(format!(
                "{}/api/v1/processing/callback/{}?task_id={}",
                self.config.public_base_url(),
                song_id,
                task_id
            )),
        };

        // The song row exists at this point; a submit failure surfaces as a
        // recoverable queue error and the caller retries submission without
        // recreating the song.
        self.queue.submit(&job).await?;

        tracing::info!(
            upload_id = %session.id,
            song_id = %song_id,
            task_id = %task_id,
            "Upload completed and processing job submitted"
        );

        Ok(CompleteUploadResponse {
            song_id,
            status: "processing".to_string(),
            message: "Upload completed; audio processing started".to_string(),
            processing_task_id: task_id,
            estimated_completion: now + Duration::minutes(ESTIMATED_PROCESSING_MINUTES),
            tracking_url: format!(
                "{}/api/v1/processing/status/{}",
                self.config.public_base_url(),
                task_id
            ),
        })
    }

    /// Read-only session snapshot. An `initiated` session past its expiry
    /// reads as `expired` even though no row was rewritten.
    pub async fn get_upload_status(
        &self,
        upload_id: &str,
    ) -> Result<UploadStatusResponse, AppError> {
        let session = self.sessions.get(upload_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Upload session {} not found", upload_id))
        })?;

        let status = if session.is_expired(Utc::now()) {
            UploadSessionStatus::Expired
        } else {
            session.status
        };

        Ok(UploadStatusResponse {
            upload_id: session.id,
            status,
            expires_at: session.expires_at,
            filename: session.filename,
            file_size: session.file_size,
        })
    }
}

fn already_completed(session: &UploadSession) -> AppError {
    match (session.song_id, session.task_id) {
        (Some(song_id), Some(task_id)) => AppError::Conflict(format!(
            "Upload session {} already completed (song {}, task {})",
            session.id, song_id, task_id
        )),
        _ => AppError::Conflict(format!(
            "Upload session {} already completed",
            session.id
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{test_config, MemoryBroker, TestStores};
    use audora_core::constants::AUDIO_PROCESSING_QUEUE;
    use audora_core::models::ProcessingConfigOverrides;

    fn service(stores: &TestStores) -> UploadService {
        UploadService::new(
            stores.sessions.clone(),
            stores.songs.clone(),
            stores.storage.clone(),
            Arc::new(QueueGateway::new(
                stores.broker.clone(),
                AUDIO_PROCESSING_QUEUE.to_string(),
                StdDuration::from_millis(5),
            )),
            test_config(),
        )
    }

    fn initiate_request(filename: &str, size: i64) -> InitiateUploadRequest {
        InitiateUploadRequest {
            filename: filename.to_string(),
            file_size: size,
            content_type: "audio/flac".to_string(),
            artist_id: Uuid::new_v4(),
        }
    }

    fn complete_request(upload_id: &str, size: i64) -> CompleteUploadRequest {
        CompleteUploadRequest {
            upload_id: upload_id.to_string(),
            file_url: "https://storage.example.com/track".to_string(),
            actual_size: size,
            etag: None,
            title: "Midnight".to_string(),
            genre_id: None,
            mood_id: None,
            description: None,
            processing_config: None,
        }
    }

    #[tokio::test]
    async fn initiate_issues_credential_and_persists_session() {
        let stores = TestStores::new();
        let svc = service(&stores);
        let user_id = Uuid::new_v4();

        let response = svc
            .initiate_upload(initiate_request("My Track.flac", 50 * 1024 * 1024), user_id)
            .await
            .unwrap();

        assert!(response.upload_url.contains("uploads/"));
        assert_eq!(response.instructions.method, "PUT");
        assert_eq!(response.max_file_size, 600 * 1024 * 1024);

        let session = stores.session(&response.upload_id);
        assert_eq!(session.status, UploadSessionStatus::Initiated);
        assert_eq!(session.user_id, user_id);
        assert!(session.object_path.starts_with("uploads/"));
        assert!(session.object_path.ends_with("my-track.flac"));
        // expiry matches the credential TTL
        assert_eq!(
            (session.expires_at - session.created_at).num_minutes(),
            15
        );
    }

    #[tokio::test]
    async fn initiate_rejects_bad_extension_and_size() {
        let stores = TestStores::new();
        let svc = service(&stores);
        let user_id = Uuid::new_v4();

        let err = svc
            .initiate_upload(initiate_request("track.ogg", 1024), user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = svc
            .initiate_upload(initiate_request("track.flac", 0), user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SizeOutOfRange { .. }));

        let err = svc
            .initiate_upload(initiate_request("track.flac", 600 * 1024 * 1024 + 1), user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SizeOutOfRange { .. }));
    }

    #[tokio::test]
    async fn complete_creates_song_and_submits_job() {
        let stores = TestStores::new();
        let svc = service(&stores);
        let user_id = Uuid::new_v4();
        let size = 50 * 1024 * 1024;

        let initiated = svc
            .initiate_upload(initiate_request("track.flac", size), user_id)
            .await
            .unwrap();
        stores.put_object(&initiated.upload_id, size);

        let completed = svc
            .complete_upload(complete_request(&initiated.upload_id, size), user_id)
            .await
            .unwrap();

        let session = stores.session(&initiated.upload_id);
        assert_eq!(session.status, UploadSessionStatus::Completed);
        assert_eq!(session.song_id, Some(completed.song_id));
        assert_eq!(session.task_id, Some(completed.processing_task_id));

        let song = stores.song(completed.song_id);
        assert_eq!(song.title, "Midnight");
        assert_eq!(song.file_size_bytes, Some(size));
        assert!(!song.is_processed);

        assert_eq!(stores.broker.queue_len(AUDIO_PROCESSING_QUEUE), 1);
        let envelope = stores.broker.last_payload(AUDIO_PROCESSING_QUEUE);
        let parsed: serde_json::Value = serde_json::from_str(&envelope).unwrap();
        let body: serde_json::Value =
            serde_json::from_str(parsed["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["kwargs"]["song_id"], completed.song_id.to_string());
        assert_eq!(body["kwargs"]["source_bucket"], "audora-tracks");
        assert_eq!(body["kwargs"]["dest_bucket"], "processed-tracks");
    }

    #[tokio::test]
    async fn complete_applies_config_overrides() {
        let stores = TestStores::new();
        let svc = service(&stores);
        let user_id = Uuid::new_v4();
        let size = 1024;

        let initiated = svc
            .initiate_upload(initiate_request("track.wav", size), user_id)
            .await
            .unwrap();
        stores.put_object(&initiated.upload_id, size);

        let mut request = complete_request(&initiated.upload_id, size);
        request.processing_config = Some(ProcessingConfigOverrides {
            target_lufs: Some(-16.0),
            generate_formats: vec![],
            quality_enhancement: None,
            preserve_dynamic_range: None,
            processing_intensity: Some("conservative".to_string()),
        });
        svc.complete_upload(request, user_id).await.unwrap();

        let envelope = stores.broker.last_payload(AUDIO_PROCESSING_QUEUE);
        let parsed: serde_json::Value = serde_json::from_str(&envelope).unwrap();
        let body: serde_json::Value =
            serde_json::from_str(parsed["body"].as_str().unwrap()).unwrap();
        let config = &body["kwargs"]["processing_config"];
        assert_eq!(config["target_lufs"], -16.0);
        assert_eq!(config["processing_intensity"], "conservative");
        // untouched fields keep worker defaults
        assert_eq!(config["generate_formats"], serde_json::json!(["mp3_320", "flac_cd"]));
    }

    #[tokio::test]
    async fn complete_rejects_unknown_session_and_wrong_owner() {
        let stores = TestStores::new();
        let svc = service(&stores);
        let user_id = Uuid::new_v4();

        let err = svc
            .complete_upload(complete_request("upload_missing", 1), user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let initiated = svc
            .initiate_upload(initiate_request("track.flac", 1024), user_id)
            .await
            .unwrap();
        stores.put_object(&initiated.upload_id, 1024);

        let err = svc
            .complete_upload(
                complete_request(&initiated.upload_id, 1024),
                Uuid::new_v4(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn complete_rejects_expired_session() {
        let stores = TestStores::new();
        let svc = service(&stores);
        let user_id = Uuid::new_v4();

        let initiated = svc
            .initiate_upload(initiate_request("track.flac", 1024), user_id)
            .await
            .unwrap();
        stores.put_object(&initiated.upload_id, 1024);
        stores.expire_session(&initiated.upload_id);

        let err = svc
            .complete_upload(complete_request(&initiated.upload_id, 1024), user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        // no side effects
        assert_eq!(
            stores.session(&initiated.upload_id).status,
            UploadSessionStatus::Initiated
        );
        assert_eq!(stores.broker.queue_len(AUDIO_PROCESSING_QUEUE), 0);
    }

    #[tokio::test]
    async fn complete_rejects_size_mismatch_without_side_effects() {
        let stores = TestStores::new();
        let svc = service(&stores);
        let user_id = Uuid::new_v4();

        let initiated = svc
            .initiate_upload(initiate_request("track.flac", 2048), user_id)
            .await
            .unwrap();
        stores.put_object(&initiated.upload_id, 2048);

        let err = svc
            .complete_upload(complete_request(&initiated.upload_id, 1024), user_id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::SizeMismatch {
                reported: 1024,
                actual: 2048
            }
        ));

        assert_eq!(
            stores.session(&initiated.upload_id).status,
            UploadSessionStatus::Initiated
        );
        assert_eq!(stores.song_count(), 0);
        assert_eq!(stores.broker.queue_len(AUDIO_PROCESSING_QUEUE), 0);
    }

    #[tokio::test]
    async fn duplicate_completion_conflicts_with_original_ids() {
        let stores = TestStores::new();
        let svc = service(&stores);
        let user_id = Uuid::new_v4();
        let size = 4096;

        let initiated = svc
            .initiate_upload(initiate_request("track.flac", size), user_id)
            .await
            .unwrap();
        stores.put_object(&initiated.upload_id, size);

        let first = svc
            .complete_upload(complete_request(&initiated.upload_id, size), user_id)
            .await
            .unwrap();

        let err = svc
            .complete_upload(complete_request(&initiated.upload_id, size), user_id)
            .await
            .unwrap_err();
        match err {
            AppError::Conflict(message) => {
                assert!(message.contains(&first.song_id.to_string()));
                assert!(message.contains(&first.processing_task_id.to_string()));
            }
            other => panic!("expected Conflict, got {:?}", other),
        }

        // exactly one song and one submitted job
        assert_eq!(stores.song_count(), 1);
        assert_eq!(stores.broker.queue_len(AUDIO_PROCESSING_QUEUE), 1);
    }

    #[tokio::test]
    async fn status_reports_expired_for_stale_initiated_sessions() {
        let stores = TestStores::new();
        let svc = service(&stores);
        let user_id = Uuid::new_v4();

        let initiated = svc
            .initiate_upload(initiate_request("track.flac", 1024), user_id)
            .await
            .unwrap();

        let status = svc.get_upload_status(&initiated.upload_id).await.unwrap();
        assert_eq!(status.status, UploadSessionStatus::Initiated);

        stores.expire_session(&initiated.upload_id);
        let status = svc.get_upload_status(&initiated.upload_id).await.unwrap();
        assert_eq!(status.status, UploadSessionStatus::Expired);
    }

    #[tokio::test]
    async fn submit_failure_preserves_song_for_retry() {
        let stores = TestStores::new();
        let svc = service(&stores);
        let user_id = Uuid::new_v4();
        let size = 1024;

        let initiated = svc
            .initiate_upload(initiate_request("track.flac", size), user_id)
            .await
            .unwrap();
        stores.put_object(&initiated.upload_id, size);
        stores.broker.fail_next_push();

        let err = svc
            .complete_upload(complete_request(&initiated.upload_id, size), user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Queue(_)));

        // the song row survives the failed submission
        assert_eq!(stores.song_count(), 1);
        assert_eq!(stores.broker.queue_len(AUDIO_PROCESSING_QUEUE), 0);
    }
}
