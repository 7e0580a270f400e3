//! In-memory store, storage and broker doubles shared by service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use audora_core::models::{
    AudioAnalysisPayload, NewSong, ProcessedFormat, ProcessingStatus, Song, UploadSession,
    UploadSessionStatus,
};
use audora_core::{AppError, Config};
use audora_db::{AudioResultStore, SongStore, UploadSessionStore};
use audora_queue::Broker;
use audora_storage::{
    BucketClass, FileInfo, PresignedUpload, Storage, StorageError, StorageResult,
};

pub fn test_config() -> Config {
    Config::for_tests()
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, UploadSession>>,
}

#[async_trait]
impl UploadSessionStore for MemorySessionStore {
    async fn create(&self, session: &UploadSession) -> Result<(), AppError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<UploadSession>, AppError> {
        Ok(self.sessions.lock().unwrap().get(id).cloned())
    }

    async fn complete(&self, id: &str, song_id: Uuid, task_id: Uuid) -> Result<bool, AppError> {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get_mut(id) {
            Some(session) if session.status == UploadSessionStatus::Initiated => {
                session.status = UploadSessionStatus::Completed;
                session.song_id = Some(song_id);
                session.task_id = Some(task_id);
                session.updated_at = Utc::now();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct MemorySongStore {
    songs: Mutex<HashMap<Uuid, Song>>,
}

impl MemorySongStore {
    pub fn set_status(&self, song_id: Uuid, status: ProcessingStatus) {
        if let Some(song) = self.songs.lock().unwrap().get_mut(&song_id) {
            song.processing_status = status;
        }
    }
}

#[async_trait]
impl SongStore for MemorySongStore {
    async fn create(&self, song: &NewSong) -> Result<Uuid, AppError> {
        let now = Utc::now();
        self.songs.lock().unwrap().insert(
            song.id,
            Song {
                id: song.id,
                artist_id: song.artist_id,
                title: song.title.clone(),
                description: song.description.clone(),
                genre_id: song.genre_id,
                mood_id: song.mood_id,
                file_url: song.file_url.clone(),
                file_size_bytes: Some(song.file_size_bytes),
                duration_seconds: None,
                is_processed: false,
                processing_status: ProcessingStatus::Pending,
                processing_error: None,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(song.id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Song>, AppError> {
        Ok(self.songs.lock().unwrap().get(&id).cloned())
    }

    async fn processing_status(&self, id: Uuid) -> Result<Option<ProcessingStatus>, AppError> {
        Ok(self
            .songs
            .lock()
            .unwrap()
            .get(&id)
            .map(|s| s.processing_status))
    }

    async fn mark_processing_completed(
        &self,
        song_id: Uuid,
        duration_seconds: Option<i32>,
    ) -> Result<(), AppError> {
        let mut songs = self.songs.lock().unwrap();
        if let Some(song) = songs.get_mut(&song_id) {
            song.processing_status = ProcessingStatus::Completed;
            song.is_processed = true;
            if duration_seconds.is_some() {
                song.duration_seconds = duration_seconds;
            }
            song.processing_error = None;
            song.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_processing_failed(&self, song_id: Uuid, error: &str) -> Result<(), AppError> {
        let mut songs = self.songs.lock().unwrap();
        if let Some(song) = songs.get_mut(&song_id) {
            song.processing_status = ProcessingStatus::Failed;
            song.processing_error = Some(error.to_string());
            song.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryResultStore {
    pub formats: Mutex<Vec<(Uuid, Uuid, ProcessedFormat)>>,
    pub analysis: Mutex<HashMap<Uuid, AudioAnalysisPayload>>,
}

#[async_trait]
impl AudioResultStore for MemoryResultStore {
    async fn insert_formats(
        &self,
        song_id: Uuid,
        task_id: Uuid,
        formats: &[ProcessedFormat],
    ) -> Result<(), AppError> {
        assert!(!formats.is_empty(), "empty format batches are never issued");
        let mut stored = self.formats.lock().unwrap();
        for format in formats {
            stored.push((song_id, task_id, format.clone()));
        }
        Ok(())
    }

    async fn insert_analysis(
        &self,
        song_id: Uuid,
        _task_id: Uuid,
        analysis: &AudioAnalysisPayload,
    ) -> Result<(), AppError> {
        let mut stored = self.analysis.lock().unwrap();
        if stored.contains_key(&song_id) {
            return Err(AppError::Conflict(format!(
                "Audio analysis already recorded for song {}",
                song_id
            )));
        }
        stored.insert(song_id, analysis.clone());
        Ok(())
    }
}

/// Storage double holding object sizes keyed by object path.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, FileInfo>>,
}

impl MemoryStorage {
    pub fn put(&self, object_path: &str, size: i64) {
        self.objects.lock().unwrap().insert(
            object_path.to_string(),
            FileInfo {
                size,
                etag: Some("test-etag".to_string()),
            },
        );
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn presigned_upload_url(
        &self,
        _bucket: BucketClass,
        object_path: &str,
        expires_in: StdDuration,
    ) -> StorageResult<PresignedUpload> {
        Ok(PresignedUpload {
            url: format!("https://storage.test/{}", object_path),
            method: "PUT".to_string(),
            headers: HashMap::from([(
                "Content-Type".to_string(),
                "application/octet-stream".to_string(),
            )]),
            expires_at: Utc::now() + Duration::seconds(expires_in.as_secs() as i64),
        })
    }

    async fn file_info(
        &self,
        _bucket: BucketClass,
        object_path: &str,
    ) -> StorageResult<FileInfo> {
        self.objects
            .lock()
            .unwrap()
            .get(object_path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(object_path.to_string()))
    }

    async fn exists(&self, _bucket: BucketClass, object_path: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(object_path))
    }
}

/// Broker double with queues as vectors and an injectable push failure.
#[derive(Default)]
pub struct MemoryBroker {
    queues: Mutex<HashMap<String, Vec<String>>>,
    results: Mutex<HashMap<String, String>>,
    fail_next: AtomicBool,
}

impl MemoryBroker {
    pub fn queue_len(&self, queue: &str) -> usize {
        self.queues
            .lock()
            .unwrap()
            .get(queue)
            .map(|q| q.len())
            .unwrap_or(0)
    }

    pub fn last_payload(&self, queue: &str) -> String {
        self.queues.lock().unwrap()[queue][0].clone()
    }

    pub fn set_result(&self, key: &str, json: &str) {
        self.results
            .lock()
            .unwrap()
            .insert(key.to_string(), json.to_string());
    }

    pub fn fail_next_push(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn push(&self, queue: &str, payload: String) -> Result<(), AppError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(AppError::Queue("Simulated broker failure".to_string()));
        }
        self.queues
            .lock()
            .unwrap()
            .entry(queue.to_string())
            .or_default()
            .insert(0, payload);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.results.lock().unwrap().get(key).cloned())
    }
}

/// One bundle of all doubles plus convenience accessors.
pub struct TestStores {
    pub sessions: Arc<MemorySessionStore>,
    pub songs: Arc<MemorySongStore>,
    pub results: Arc<MemoryResultStore>,
    pub storage: Arc<MemoryStorage>,
    pub broker: Arc<MemoryBroker>,
}

impl TestStores {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(MemorySessionStore::default()),
            songs: Arc::new(MemorySongStore::default()),
            results: Arc::new(MemoryResultStore::default()),
            storage: Arc::new(MemoryStorage::default()),
            broker: Arc::new(MemoryBroker::default()),
        }
    }

    pub fn session(&self, id: &str) -> UploadSession {
        self.sessions.sessions.lock().unwrap()[id].clone()
    }

    pub fn expire_session(&self, id: &str) {
        let mut sessions = self.sessions.sessions.lock().unwrap();
        let session = sessions.get_mut(id).unwrap();
        session.expires_at = past();
    }

    /// Simulate the client's direct PUT: register the object behind the
    /// session's derived path.
    pub fn put_object(&self, upload_id: &str, size: i64) {
        let object_path = self.session(upload_id).object_path;
        self.storage.put(&object_path, size);
    }

    pub fn song(&self, id: Uuid) -> Song {
        self.songs.songs.lock().unwrap()[&id].clone()
    }

    pub fn song_count(&self) -> usize {
        self.songs.songs.lock().unwrap().len()
    }
}

fn past() -> DateTime<Utc> {
    Utc::now() - Duration::minutes(30)
}
