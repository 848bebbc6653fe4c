use std::io;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{multipart::Field, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::documents::dtos::{
    DeleteDocumentResponseDto, DocumentResponseDto, HealthResponseDto, UploadDocumentDto,
    UploadFieldsDto,
};
use crate::features::documents::services::{DocumentService, UploadRequest};
use crate::shared::types::{ApiResponse, Meta};

/// Unparseable ids name no document
fn parse_document_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("Document {} not found", raw)))
}

/// Length of a multipart part, when the client declared one
fn declared_length(field: &Field<'_>) -> Option<i64> {
    field
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
}

/// Upload a document
///
/// Accepts multipart/form-data with:
/// - `expires_in`: lifetime in seconds (optional, must come before `file`)
/// - `file`: The file to upload (required), streamed straight to storage
#[utoipa::path(
    post,
    path = "/api/documents/upload",
    tag = "documents",
    request_body(
        content = UploadDocumentDto,
        content_type = "multipart/form-data",
        description = "Document upload form with an optional expires_in field",
    ),
    responses(
        (status = 201, description = "Document uploaded successfully", body = ApiResponse<DocumentResponseDto>),
        (status = 400, description = "Missing file or invalid input"),
        (status = 413, description = "File too large"),
        (status = 503, description = "Storage or database unavailable")
    )
)]
pub async fn upload_document(
    State(service): State<Arc<DocumentService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<DocumentResponseDto>>)> {
    let mut fields = UploadFieldsDto::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "expires_in" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read expires_in field: {}", e))
                })?;
                let text = text.trim();
                if !text.is_empty() {
                    let secs = text.parse::<i64>().map_err(|_| {
                        AppError::InvalidInput(format!(
                            "expires_in must be a whole number of seconds, got '{}'",
                            text
                        ))
                    })?;
                    fields.expires_in = Some(secs);
                }
            }
            "file" => {
                fields
                    .validate()
                    .map_err(|e| AppError::InvalidInput(e.to_string()))?;

                let request = UploadRequest {
                    file_name: field.file_name().unwrap_or("").to_string(),
                    declared_size: declared_length(&field),
                    content_type: field.content_type().unwrap_or("").to_string(),
                    expires_in_seconds: fields.expires_in,
                };

                let mut reader = Box::pin(StreamReader::new(field.map_err(io::Error::other)));
                let document = service.upload(request, &mut reader).await?;

                return Ok((
                    StatusCode::CREATED,
                    Json(ApiResponse::success(
                        Some(document.into()),
                        Some("Document uploaded successfully".to_string()),
                        None,
                    )),
                ));
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    Err(AppError::BadRequest("File is required".to_string()))
}

/// List all documents, newest first
#[utoipa::path(
    get,
    path = "/api/documents",
    tag = "documents",
    responses(
        (status = 200, description = "Documents retrieved successfully", body = ApiResponse<Vec<DocumentResponseDto>>),
        (status = 503, description = "Database unavailable")
    )
)]
pub async fn list_documents(
    State(service): State<Arc<DocumentService>>,
) -> Result<Json<ApiResponse<Vec<DocumentResponseDto>>>> {
    let documents: Vec<DocumentResponseDto> = service
        .list()
        .await?
        .into_iter()
        .map(DocumentResponseDto::from)
        .collect();
    let total = documents.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(documents),
        None,
        Some(Meta { total }),
    )))
}

/// Get document metadata
#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document retrieved successfully", body = ApiResponse<DocumentResponseDto>),
        (status = 404, description = "Document not found"),
        (status = 503, description = "Database unavailable")
    )
)]
pub async fn get_document(
    State(service): State<Arc<DocumentService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DocumentResponseDto>>> {
    let document = service.get_metadata(parse_document_id(&id)?).await?;
    Ok(Json(ApiResponse::success(Some(document.into()), None, None)))
}

/// Download document content
///
/// Streams the stored bytes with the document's content type.
#[utoipa::path(
    get,
    path = "/api/documents/{id}/download",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document content", content_type = "application/octet-stream"),
        (status = 404, description = "Document or its content not found"),
        (status = 503, description = "Storage or database unavailable")
    )
)]
pub async fn download_document(
    State(service): State<Arc<DocumentService>>,
    Path(id): Path<String>,
) -> Result<Response> {
    let download = service.download(parse_document_id(&id)?).await?;

    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(&download.document.file_name)
    );

    Ok((
        [
            (header::CONTENT_TYPE, download.document.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(download.stream),
    )
        .into_response())
}

/// Delete a document
#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document deleted successfully", body = ApiResponse<DeleteDocumentResponseDto>),
        (status = 404, description = "Document not found"),
        (status = 503, description = "Storage or database unavailable")
    )
)]
pub async fn delete_document(
    State(service): State<Arc<DocumentService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeleteDocumentResponseDto>>> {
    service.delete(parse_document_id(&id)?).await?;

    Ok(Json(ApiResponse::success(
        Some(DeleteDocumentResponseDto { deleted: true }),
        Some("Document deleted successfully".to_string()),
        None,
    )))
}

/// Report collaborator health
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "All services healthy", body = HealthResponseDto),
        (status = 503, description = "One or more services degraded", body = HealthResponseDto)
    )
)]
pub async fn health_check(
    State(service): State<Arc<DocumentService>>,
) -> (StatusCode, Json<HealthResponseDto>) {
    let report = service.health().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(report.into()))
}
