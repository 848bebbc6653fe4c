use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::core::error::{AppError, Result};
use crate::modules::storage::{BlobStore, BlobStream};
use crate::shared::test_helpers::{FailurePlan, Fault};

/// Chunk size used when replaying a stored blob, small enough to force several chunks
const CHUNK_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobOp {
    Upload,
    Download,
    Delete,
    Ping,
}

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub data: Bytes,
    pub content_type: String,
}

/// In-memory blob store for tests
#[derive(Default)]
pub struct InMemoryBlobStore {
    objects: Mutex<HashMap<String, StoredBlob>>,
    faults: FailurePlan<BlobOp>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(&self, op: BlobOp, fault: Fault) {
        self.faults.inject(op, fault);
    }

    pub fn clear(&self, op: BlobOp) {
        self.faults.clear(op);
    }

    pub fn get(&self, key: &str) -> Option<StoredBlob> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    /// Drop an object behind the orchestrator's back
    pub fn remove_silently(&self, key: &str) {
        self.objects.lock().unwrap().remove(key);
    }

    async fn check(&self, op: BlobOp) -> Result<()> {
        self.faults.check(op, AppError::StorageUnavailable).await
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(
        &self,
        key: &str,
        _size_hint: Option<u64>,
        content_type: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<()> {
        self.check(BlobOp::Upload).await?;

        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .await
            .map_err(|e| AppError::StorageUnavailable(format!("Failed to read upload: {}", e)))?;

        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredBlob {
                data: Bytes::from(data),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<BlobStream> {
        self.check(BlobOp::Download).await?;

        let blob = self
            .get(key)
            .ok_or_else(|| AppError::NotFound(format!("Blob '{}' not found", key)))?;

        let chunks: Vec<Result<Bytes>> = blob
            .data
            .chunks(CHUNK_SIZE)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(futures::stream::iter(chunks).boxed())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check(BlobOp::Delete).await?;
        self.objects
            .lock()
            .unwrap()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Blob '{}' not found", key)))
    }

    async fn ping(&self) -> Result<()> {
        self.check(BlobOp::Ping).await
    }
}
