use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::documents::models::Document;
use crate::features::documents::services::HealthReport;

/// Upload document request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler streams axum's Multipart fields directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadDocumentDto {
    /// Optional lifetime in seconds; must precede `file` in the form to take effect
    #[schema(example = 3600)]
    pub expires_in: Option<i64>,
    /// The file to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// Text fields accepted alongside the uploaded file
#[derive(Debug, Default, Validate)]
pub struct UploadFieldsDto {
    /// Seconds until expiry; zero or negative means never
    #[validate(range(max = 315_360_000, message = "expires_in must be at most ten years"))]
    pub expires_in: Option<i64>,
}

/// Response DTO for document metadata
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponseDto {
    /// Unique identifier for the document
    pub id: Uuid,
    pub file_name: String,
    /// Size in bytes as declared at upload
    pub file_size: i64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    /// Absent when the document never expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Document> for DocumentResponseDto {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            file_name: document.file_name,
            file_size: document.file_size,
            content_type: document.content_type,
            created_at: document.created_at,
            expires_at: document.expires_at,
        }
    }
}

/// Response DTO for delete operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteDocumentResponseDto {
    /// Confirmation that the document was deleted
    pub deleted: bool,
}

/// Status of each collaborator: "ok", "timeout" or "error: ..."
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceStatusDto {
    pub database: String,
    pub storage: String,
    pub queue: String,
}

/// Response DTO for the health probe
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponseDto {
    /// "healthy" when every service is ok, otherwise "degraded"
    #[schema(example = "healthy")]
    pub status: String,
    pub services: ServiceStatusDto,
}

impl From<HealthReport> for HealthResponseDto {
    fn from(report: HealthReport) -> Self {
        let status = if report.is_healthy() {
            "healthy"
        } else {
            "degraded"
        };

        Self {
            status: status.to_string(),
            services: ServiceStatusDto {
                database: report.database,
                storage: report.storage,
                queue: report.queue,
            },
        }
    }
}
