use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use tokio::io::AsyncRead;

use crate::core::error::Result;

/// Readable byte stream of a stored blob. Dropping it closes the download.
pub type BlobStream = BoxStream<'static, Result<Bytes>>;

/// Object storage for document bytes, keyed by file name.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stream `reader` to exhaustion into the object at `key`.
    ///
    /// `size_hint` is the caller's declared length and may be absent.
    async fn upload(
        &self,
        key: &str,
        size_hint: Option<u64>,
        content_type: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<()>;

    /// Open a read stream over the object at `key`, `NotFound` if it is missing
    async fn download(&self, key: &str) -> Result<BlobStream>;

    /// Remove the object at `key`
    async fn delete(&self, key: &str) -> Result<()>;

    /// Cheap connectivity probe
    async fn ping(&self) -> Result<()>;
}
