//! MinIO/S3-compatible storage client
//!
//! Streams document bytes in and out of a single bucket. Uses the rust-s3
//! crate for lightweight S3 operations.

use async_trait::async_trait;
use futures::StreamExt;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, BucketConfiguration, Region};
use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

use crate::core::config::MinIOConfig;
use crate::core::error::{AppError, Result};
use crate::modules::storage::{BlobStore, BlobStream};

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    key_prefix: String,
}

impl MinIOClient {
    /// Create a new MinIO client from configuration
    ///
    /// Creates the bucket if it doesn't exist.
    pub async fn new(config: MinIOConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        let client = Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint,
            key_prefix: config.key_prefix,
        };

        client.ensure_bucket_exists().await?;

        info!(
            "MinIO client initialized for endpoint: {}, bucket: {}, key_prefix: {}",
            client.endpoint,
            client.bucket.name(),
            client.key_prefix
        );

        Ok(client)
    }

    /// Ensure the bucket exists, create if not
    pub async fn ensure_bucket_exists(&self) -> Result<()> {
        match Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        {
            Ok(_) => {
                info!("Bucket '{}' created successfully", self.bucket.name());
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    // The bucket may still exist; the first real call will tell
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
                Ok(())
            }
        }
    }

    /// Get the bucket name
    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    fn object_key(&self, file_name: &str) -> String {
        object_key(&self.key_prefix, file_name)
    }
}

/// Build the object key for a file name under `prefix`
fn object_key(prefix: &str, file_name: &str) -> String {
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", prefix, file_name)
    }
}

/// Map an S3 failure onto the error taxonomy; a 404 means the blob is gone
fn classify(key: &str, action: &str, e: S3Error) -> AppError {
    match e {
        S3Error::HttpFailWithBody(404, _) => {
            AppError::NotFound(format!("Blob '{}' not found", key))
        }
        other => AppError::StorageUnavailable(format!(
            "Failed to {} '{}': {}",
            action, key, other
        )),
    }
}

/// Map a non-success HTTP status onto the error taxonomy
fn check_status(key: &str, action: &str, status: u16) -> Result<()> {
    match status {
        200..=299 => Ok(()),
        404 => Err(AppError::NotFound(format!("Blob '{}' not found", key))),
        code => Err(AppError::StorageUnavailable(format!(
            "Failed to {} '{}': status {}",
            action, key, code
        ))),
    }
}

#[async_trait]
impl BlobStore for MinIOClient {
    async fn upload(
        &self,
        key: &str,
        size_hint: Option<u64>,
        content_type: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<()> {
        let object_key = self.object_key(key);
        let mut reader = reader;

        let response = self
            .bucket
            .put_object_stream_with_content_type(&mut reader, &object_key, content_type)
            .await
            .map_err(|e| classify(&object_key, "upload", e))?;
        check_status(&object_key, "upload", response.status_code())?;

        debug!(
            "Uploaded '{}' to bucket '{}' (declared={:?}, streamed={})",
            object_key,
            self.bucket.name(),
            size_hint,
            response.uploaded_bytes()
        );
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<BlobStream> {
        let object_key = self.object_key(key);

        let response = self
            .bucket
            .get_object_stream(&object_key)
            .await
            .map_err(|e| classify(&object_key, "download", e))?;
        check_status(&object_key, "download", response.status_code)?;

        debug!(
            "Opened download stream for '{}' from bucket '{}'",
            object_key,
            self.bucket.name()
        );

        let stream = response.bytes.map(move |chunk| {
            chunk.map_err(|e| {
                AppError::StorageUnavailable(format!("Failed to read '{}': {}", object_key, e))
            })
        });
        Ok(stream.boxed())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let object_key = self.object_key(key);

        let response = self
            .bucket
            .delete_object(&object_key)
            .await
            .map_err(|e| classify(&object_key, "delete", e))?;
        check_status(&object_key, "delete", response.status_code())?;

        debug!(
            "Deleted '{}' from bucket '{}'",
            object_key,
            self.bucket.name()
        );
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let (_, status) = self
            .bucket
            .location()
            .await
            .map_err(|e| AppError::StorageUnavailable(format!("Bucket unreachable: {}", e)))?;
        check_status(&self.bucket.name(), "locate bucket", status)
    }
}
