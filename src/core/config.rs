use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub minio: MinIOConfig,
    pub queue: QueueConfig,
    pub worker: WorkerConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// MinIO/S3 storage configuration for document blobs
#[derive(Debug, Clone)]
pub struct MinIOConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Access key for authentication
    pub access_key: String,
    /// Secret key for authentication
    pub secret_key: String,
    /// Bucket name for storing document blobs
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
    /// Prefix prepended to every object key (e.g., "documents")
    pub key_prefix: String,
}

/// SQS configuration for lifecycle events
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub queue_url: String,
    pub region: String,
    /// Endpoint override for local development (e.g. LocalStack)
    pub endpoint_url: Option<String>,
    /// Long-poll wait per receive call, SQS caps this at 20 seconds
    pub wait_time_secs: i32,
    /// Maximum messages per receive call, SQS caps this at 10
    pub max_messages: i32,
}

/// Background worker and collaborator timing
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub expiry_sweep_interval: Duration,
    pub health_check_timeout: Duration,
    pub collaborator_timeout: Duration,
    pub transfer_timeout: Duration,
    pub consumer_retry_backoff: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            minio: MinIOConfig::from_env()?,
            queue: QueueConfig::from_env()?,
            worker: WorkerConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

/// Read an optional numeric variable, falling back to `default` when unset.
fn parse_var<T>(name: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr + ToString,
{
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .map_err(|_| format!("{} must be a valid number", name))
}

impl AppConfig {
    const DEFAULT_MAX_UPLOAD_SIZE: usize = 100 * 1024 * 1024; // 100MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_upload_size = parse_var("MAX_UPLOAD_SIZE", Self::DEFAULT_MAX_UPLOAD_SIZE)?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_upload_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    // Default values for database connection pool (conservative defaults for small-medium apps)
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(Self {
            url,
            max_connections: parse_var("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_var("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: parse_var(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_var("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
            max_lifetime_secs: parse_var("DB_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?,
        })
    }
}

impl MinIOConfig {
    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("MINIO_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());

        let access_key = env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let secret_key = env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let bucket = env::var("MINIO_BUCKET").unwrap_or_else(|_| "docvault".to_string());

        let region = env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let key_prefix = env::var("MINIO_KEY_PREFIX")
            .map(|p| p.trim_matches('/').to_string())
            .unwrap_or_else(|_| "documents".to_string());

        Ok(Self {
            endpoint,
            access_key,
            secret_key,
            bucket,
            region,
            key_prefix,
        })
    }
}

impl QueueConfig {
    const DEFAULT_WAIT_TIME_SECS: i32 = 20;
    const DEFAULT_MAX_MESSAGES: i32 = 10;

    pub fn from_env() -> Result<Self, String> {
        let queue_url = env::var("SQS_QUEUE_URL")
            .map_err(|_| "SQS_QUEUE_URL environment variable is required".to_string())?;

        let region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let endpoint_url = env::var("SQS_ENDPOINT_URL").ok().filter(|s| !s.is_empty());

        let wait_time_secs =
            parse_var("SQS_WAIT_TIME_SECS", Self::DEFAULT_WAIT_TIME_SECS)?.clamp(0, 20);
        let max_messages = parse_var("SQS_MAX_MESSAGES", Self::DEFAULT_MAX_MESSAGES)?.clamp(1, 10);

        Ok(Self {
            queue_url,
            region,
            endpoint_url,
            wait_time_secs,
            max_messages,
        })
    }
}

impl WorkerConfig {
    const DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS: u64 = 30;
    const DEFAULT_HEALTH_CHECK_TIMEOUT_SECS: u64 = 2;
    const DEFAULT_COLLABORATOR_TIMEOUT_SECS: u64 = 10;
    const DEFAULT_TRANSFER_TIMEOUT_SECS: u64 = 300; // 5 minutes
    const DEFAULT_CONSUMER_RETRY_BACKOFF_SECS: u64 = 1;

    pub fn from_env() -> Result<Self, String> {
        let sweep_secs = parse_var(
            "EXPIRY_SWEEP_INTERVAL_SECS",
            Self::DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS,
        )?;
        if sweep_secs == 0 {
            return Err("EXPIRY_SWEEP_INTERVAL_SECS must be greater than zero".to_string());
        }

        Ok(Self {
            expiry_sweep_interval: Duration::from_secs(sweep_secs),
            health_check_timeout: Duration::from_secs(parse_var(
                "HEALTH_CHECK_TIMEOUT_SECS",
                Self::DEFAULT_HEALTH_CHECK_TIMEOUT_SECS,
            )?),
            collaborator_timeout: Duration::from_secs(parse_var(
                "COLLABORATOR_TIMEOUT_SECS",
                Self::DEFAULT_COLLABORATOR_TIMEOUT_SECS,
            )?),
            transfer_timeout: Duration::from_secs(parse_var(
                "TRANSFER_TIMEOUT_SECS",
                Self::DEFAULT_TRANSFER_TIMEOUT_SECS,
            )?),
            consumer_retry_backoff: Duration::from_secs(parse_var(
                "CONSUMER_RETRY_BACKOFF_SECS",
                Self::DEFAULT_CONSUMER_RETRY_BACKOFF_SECS,
            )?),
        })
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            expiry_sweep_interval: Duration::from_secs(Self::DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS),
            health_check_timeout: Duration::from_secs(Self::DEFAULT_HEALTH_CHECK_TIMEOUT_SECS),
            collaborator_timeout: Duration::from_secs(Self::DEFAULT_COLLABORATOR_TIMEOUT_SECS),
            transfer_timeout: Duration::from_secs(Self::DEFAULT_TRANSFER_TIMEOUT_SECS),
            consumer_retry_backoff: Duration::from_secs(
                Self::DEFAULT_CONSUMER_RETRY_BACKOFF_SECS,
            ),
        }
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "DocVault API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Document storage with expiry and lifecycle events".to_string());

        Ok(Self {
            title,
            version,
            description,
        })
    }
}
