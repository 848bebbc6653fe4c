mod document_repository;
#[cfg(test)]
pub mod memory;

pub use document_repository::{MetadataStore, PgDocumentStore};
