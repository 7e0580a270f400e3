//! Configuration module
//!
//! Environment-driven configuration for the API process: server, database,
//! Redis broker, object storage buckets, and upload/processing limits.

use std::env;

use crate::constants;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PORT: u16 = 4000;
const RESULT_POLL_INTERVAL_SECS: u64 = 2;

#[derive(Clone, Debug)]
pub struct Config {
    server_port: u16,
    cors_origins: Vec<String>,
    environment: String,
    database_url: String,
    db_max_connections: u32,
    db_timeout_seconds: u64,
    redis_url: String,
    s3_region: String,
    s3_endpoint: Option<String>,
    tracks_bucket: String,
    processed_bucket: String,
    max_upload_size_bytes: i64,
    allowed_audio_extensions: Vec<String>,
    upload_session_ttl_minutes: i64,
    processing_queue: String,
    result_poll_interval_secs: u64,
    public_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let allowed_audio_extensions = env::var("ALLOWED_AUDIO_EXTENSIONS")
            .unwrap_or_else(|_| constants::ALLOWED_AUDIO_EXTENSIONS.join(","))
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        Ok(Self {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            s3_region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            tracks_bucket: env::var("TRACKS_BUCKET")
                .unwrap_or_else(|_| "audora-tracks".to_string()),
            processed_bucket: env::var("PROCESSED_BUCKET")
                .unwrap_or_else(|_| "processed-tracks".to_string()),
            max_upload_size_bytes: env::var("MAX_UPLOAD_SIZE_BYTES")
                .unwrap_or_else(|_| constants::MAX_UPLOAD_SIZE_BYTES.to_string())
                .parse()
                .unwrap_or(constants::MAX_UPLOAD_SIZE_BYTES),
            allowed_audio_extensions,
            upload_session_ttl_minutes: env::var("UPLOAD_SESSION_TTL_MINUTES")
                .unwrap_or_else(|_| constants::UPLOAD_SESSION_TTL_MINUTES.to_string())
                .parse()
                .unwrap_or(constants::UPLOAD_SESSION_TTL_MINUTES),
            processing_queue: env::var("AUDIO_PROCESSING_QUEUE")
                .unwrap_or_else(|_| constants::AUDIO_PROCESSING_QUEUE.to_string()),
            result_poll_interval_secs: env::var("RESULT_POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| RESULT_POLL_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(RESULT_POLL_INTERVAL_SECS),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", DEFAULT_PORT))
                .trim_end_matches('/')
                .to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_upload_size_bytes <= 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_BYTES must be positive"));
        }
        if self.upload_session_ttl_minutes <= 0 {
            return Err(anyhow::anyhow!("UPLOAD_SESSION_TTL_MINUTES must be positive"));
        }
        if self.allowed_audio_extensions.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_AUDIO_EXTENSIONS cannot be empty"));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.db_timeout_seconds
    }

    pub fn redis_url(&self) -> &str {
        &self.redis_url
    }

    pub fn s3_region(&self) -> &str {
        &self.s3_region
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.s3_endpoint.as_deref()
    }

    pub fn tracks_bucket(&self) -> &str {
        &self.tracks_bucket
    }

    pub fn processed_bucket(&self) -> &str {
        &self.processed_bucket
    }

    pub fn max_upload_size_bytes(&self) -> i64 {
        self.max_upload_size_bytes
    }

    pub fn allowed_audio_extensions(&self) -> &[String] {
        &self.allowed_audio_extensions
    }

    pub fn upload_session_ttl_minutes(&self) -> i64 {
        self.upload_session_ttl_minutes
    }

    pub fn processing_queue(&self) -> &str {
        &self.processing_queue
    }

    pub fn result_poll_interval_secs(&self) -> u64 {
        self.result_poll_interval_secs
    }

    /// Externally reachable base URL, used for worker callbacks and tracking
    /// links handed to clients.
    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    /// Fixed default configuration that bypasses the environment; for tests.
    pub fn for_tests() -> Self {
        Self {
            server_port: DEFAULT_PORT,
            cors_origins: vec!["*".to_string()],
            environment: "test".to_string(),
            database_url: "postgres://localhost/audora_test".to_string(),
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_endpoint: None,
            tracks_bucket: "audora-tracks".to_string(),
            processed_bucket: "processed-tracks".to_string(),
            max_upload_size_bytes: constants::MAX_UPLOAD_SIZE_BYTES,
            allowed_audio_extensions: constants::ALLOWED_AUDIO_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            upload_session_ttl_minutes: constants::UPLOAD_SESSION_TTL_MINUTES,
            processing_queue: constants::AUDIO_PROCESSING_QUEUE.to_string(),
            result_poll_interval_secs: RESULT_POLL_INTERVAL_SECS,
            public_base_url: format!("http://localhost:{}", DEFAULT_PORT),
        }
    }
}
