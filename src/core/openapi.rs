use utoipa::{Modify, OpenApi};

use crate::features::documents::{dtos as documents_dtos, handlers as documents_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Documents
        documents_handlers::upload_document,
        documents_handlers::list_documents,
        documents_handlers::get_document,
        documents_handlers::download_document,
        documents_handlers::delete_document,
        // Health
        documents_handlers::health_check,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Documents
            documents_dtos::UploadDocumentDto,
            documents_dtos::DocumentResponseDto,
            documents_dtos::DeleteDocumentResponseDto,
            ApiResponse<documents_dtos::DocumentResponseDto>,
            ApiResponse<Vec<documents_dtos::DocumentResponseDto>>,
            ApiResponse<documents_dtos::DeleteDocumentResponseDto>,
            // Health
            documents_dtos::ServiceStatusDto,
            documents_dtos::HealthResponseDto,
        )
    ),
    tags(
        (name = "documents", description = "Document upload, retrieval and deletion"),
        (name = "health", description = "Collaborator liveness"),
    ),
    info(
        title = "DocVault API",
        version = "0.1.0",
        description = "API documentation for DocVault",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
