use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use tokio::io::AsyncRead;
use tokio_util::io::InspectReader;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::config::WorkerConfig;
use crate::core::error::{AppError, Result};
use crate::features::documents::models::{Document, DocumentEvent, EventType};
use crate::features::documents::repositories::MetadataStore;
use crate::modules::queue::EventQueue;
use crate::modules::storage::{BlobStore, BlobStream};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
pub const HEALTH_OK: &str = "ok";
pub const HEALTH_TIMEOUT: &str = "timeout";

/// Caller-supplied attributes of a new document
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub file_name: String,
    /// Length the caller claims; persisted as-is when present
    pub declared_size: Option<i64>,
    pub content_type: String,
    pub expires_in_seconds: Option<i64>,
}

/// A resolved document and an open stream over its bytes
pub struct DocumentDownload {
    pub document: Document,
    pub stream: BlobStream,
}

impl fmt::Debug for DocumentDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentDownload")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

/// Per-collaborator liveness, each value `"ok"`, `"timeout"` or `"error: ..."`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub database: String,
    pub storage: String,
    pub queue: String,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        [&self.database, &self.storage, &self.queue]
            .iter()
            .all(|status| status.as_str() == HEALTH_OK)
    }
}

/// Coordinates the blob store, the metadata store and the event queue
/// across the document lifecycle.
///
/// Writes are strictly ordered: blob before row on upload, row lookup then
/// blob then row on removal. Nothing is rolled back; a failure part-way
/// through leaves an orphan blob or a dangling row, never a row without a
/// blob written first.
pub struct DocumentService {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    queue: Arc<dyn EventQueue>,
    collaborator_timeout: Duration,
    transfer_timeout: Duration,
    health_check_timeout: Duration,
}

impl DocumentService {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        queue: Arc<dyn EventQueue>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            metadata,
            blobs,
            queue,
            collaborator_timeout: config.collaborator_timeout,
            transfer_timeout: config.transfer_timeout,
            health_check_timeout: config.health_check_timeout,
        }
    }

    /// Store a new document.
    ///
    /// The blob is streamed from `reader` before the metadata row is written.
    /// A failed blob write aborts without touching metadata; a failed row
    /// write leaves the blob behind as an orphan. The `created` event is
    /// best-effort.
    pub async fn upload(
        &self,
        request: UploadRequest,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<Document> {
        let file_name = validate_file_name(&request.file_name)?;
        let size_hint = match request.declared_size {
            Some(size) if size < 0 => {
                return Err(AppError::InvalidInput(format!(
                    "File size must not be negative, got {}",
                    size
                )));
            }
            Some(size) => Some(size as u64),
            None => None,
        };
        let content_type = match request.content_type.trim() {
            "" => DEFAULT_CONTENT_TYPE.to_string(),
            ct => ct.to_string(),
        };

        let mut document = Document::new(
            file_name,
            request.declared_size.unwrap_or(0),
            content_type,
            // Postgres keeps microseconds
            Utc::now().trunc_subsecs(6),
            request.expires_in_seconds,
        )?;

        let mut streamed: u64 = 0;
        {
            let mut counting = InspectReader::new(reader, |chunk: &[u8]| {
                streamed += chunk.len() as u64;
            });
            bounded(
                self.transfer_timeout,
                AppError::StorageUnavailable,
                "blob upload",
                self.blobs.upload(
                    &document.file_name,
                    size_hint,
                    &document.content_type,
                    &mut counting,
                ),
            )
            .await?;
        }

        if request.declared_size.is_none() {
            document.file_size = i64::try_from(streamed).map_err(|_| {
                AppError::InvalidInput(format!("Upload of {} bytes is too large", streamed))
            })?;
        }

        debug!(
            document_id = %document.id,
            "Blob stored for '{}' ({} bytes streamed)", document.file_name, streamed
        );

        if let Err(e) = bounded(
            self.collaborator_timeout,
            AppError::MetadataUnavailable,
            "metadata save",
            self.metadata.save(&document),
        )
        .await
        {
            warn!(
                document_id = %document.id,
                "Metadata write failed, blob '{}' left orphaned: {}", document.file_name, e
            );
            return Err(e);
        }

        info!(
            document_id = %document.id,
            "Document uploaded: name={}, size={}, content_type={}, expires_at={:?}",
            document.file_name, document.file_size, document.content_type, document.expires_at
        );

        self.publish_event(&document, EventType::Created).await;

        Ok(document)
    }

    /// All documents, newest first
    pub async fn list(&self) -> Result<Vec<Document>> {
        bounded(
            self.collaborator_timeout,
            AppError::MetadataUnavailable,
            "metadata list",
            self.metadata.find_all(),
        )
        .await
    }

    /// Resolve a document without touching the blob store
    pub async fn get_metadata(&self, id: Uuid) -> Result<Document> {
        bounded(
            self.collaborator_timeout,
            AppError::MetadataUnavailable,
            "metadata lookup",
            self.metadata.find_by_id(id),
        )
        .await
    }

    /// Documents due for expiry at `now`
    pub async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Document>> {
        bounded(
            self.collaborator_timeout,
            AppError::MetadataUnavailable,
            "expired lookup",
            self.metadata.find_expired(now),
        )
        .await
    }

    /// Resolve a document and open a stream over its bytes.
    ///
    /// A row whose blob is missing surfaces as the blob store's `NotFound`.
    pub async fn download(&self, id: Uuid) -> Result<DocumentDownload> {
        let document = self.get_metadata(id).await?;

        let stream = bounded(
            self.collaborator_timeout,
            AppError::StorageUnavailable,
            "blob download",
            self.blobs.download(&document.file_name),
        )
        .await?;

        Ok(DocumentDownload { document, stream })
    }

    /// Explicitly remove a document. Fails with `NotFound` for an unknown id,
    /// including one that was already deleted.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.remove(id, EventType::Deleted).await
    }

    /// Remove a document whose expiry has passed
    pub async fn expire(&self, id: Uuid) -> Result<()> {
        self.remove(id, EventType::Expired).await
    }

    /// Probe all three collaborators concurrently. Never fails.
    pub async fn health(&self) -> HealthReport {
        let limit = self.health_check_timeout;
        let (database, storage, queue) = tokio::join!(
            probe(limit, self.metadata.ping()),
            probe(limit, self.blobs.ping()),
            probe(limit, self.queue.ping()),
        );

        HealthReport {
            database,
            storage,
            queue,
        }
    }

    async fn remove(&self, id: Uuid, event_type: EventType) -> Result<()> {
        let document = self.get_metadata(id).await?;

        match bounded(
            self.collaborator_timeout,
            AppError::StorageUnavailable,
            "blob delete",
            self.blobs.delete(&document.file_name),
        )
        .await
        {
            Ok(()) => {}
            // Already gone; the row is still ours to remove
            Err(AppError::NotFound(_)) => {
                warn!(
                    document_id = %id,
                    "Blob '{}' was already missing, removing metadata anyway", document.file_name
                );
            }
            Err(e) => return Err(e),
        }

        if let Err(e) = bounded(
            self.collaborator_timeout,
            AppError::MetadataUnavailable,
            "metadata delete",
            self.metadata.delete(id),
        )
        .await
        {
            if !matches!(e, AppError::NotFound(_)) {
                error!(
                    document_id = %id,
                    "Blob '{}' deleted but metadata row remains: {}", document.file_name, e
                );
            }
            return Err(e);
        }

        info!(document_id = %id, "Document {}: {}", event_type, document.file_name);

        self.publish_event(&document, event_type).await;
        Ok(())
    }

    async fn publish_event(&self, document: &Document, event_type: EventType) {
        let event = DocumentEvent::for_document(document, event_type);
        let body = match serde_json::to_string(&event) {
            Ok(body) => body,
            Err(e) => {
                warn!(document_id = %document.id, "Failed to serialize {} event: {}", event_type, e);
                return;
            }
        };

        match bounded(
            self.collaborator_timeout,
            AppError::QueueUnavailable,
            "event publish",
            self.queue.publish(&body),
        )
        .await
        {
            Ok(()) => debug!(document_id = %document.id, "Published {} event", event_type),
            Err(e) => warn!(
                document_id = %document.id,
                "Failed to publish {} event: {}", event_type, e
            ),
        }
    }
}

/// File names double as blob keys, so they must be a single path segment
fn validate_file_name(file_name: &str) -> Result<&str> {
    if file_name.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "File name must not be empty".to_string(),
        ));
    }
    if file_name == "." || file_name == ".." {
        return Err(AppError::InvalidInput(format!(
            "'{}' is not a valid file name",
            file_name
        )));
    }
    if file_name
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(AppError::InvalidInput(
            "File name must not contain path separators or control characters".to_string(),
        ));
    }
    Ok(file_name)
}

/// Run a collaborator call under `limit`, mapping elapse to that collaborator's error
async fn bounded<T>(
    limit: Duration,
    unavailable: fn(String) -> AppError,
    what: &str,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(unavailable(format!("{} timed out after {:?}", what, limit))),
    }
}

async fn probe(limit: Duration, ping: impl Future<Output = Result<()>>) -> String {
    match tokio::time::timeout(limit, ping).await {
        Ok(Ok(())) => HEALTH_OK.to_string(),
        Ok(Err(e)) => format!("error: {}", e),
        Err(_) => HEALTH_TIMEOUT.to_string(),
    }
}
