//! Storage module for document bytes
//!
//! Provides the blob store seam and its MinIO/S3-compatible implementation.

mod blob_store;
#[cfg(test)]
pub mod memory;
mod minio_client;

pub use blob_store::{BlobStore, BlobStream};
pub use minio_client::MinIOClient;
