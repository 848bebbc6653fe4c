use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::documents::handlers::{
    delete_document, download_document, get_document, health_check, list_documents,
    upload_document,
};
use crate::features::documents::services::DocumentService;

/// Headroom above the file itself for multipart boundaries and text fields
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Create routes for the documents feature
pub fn routes(document_service: Arc<DocumentService>, max_upload_size: usize) -> Router {
    Router::new()
        .route(
            "/api/documents/upload",
            post(upload_document)
                .layer(DefaultBodyLimit::max(max_upload_size + MULTIPART_OVERHEAD)),
        )
        .route("/api/documents", get(list_documents))
        .route(
            "/api/documents/{id}",
            get(get_document).delete(delete_document),
        )
        .route("/api/documents/{id}/download", get(download_document))
        .route("/health", get(health_check))
        .with_state(document_service)
}
