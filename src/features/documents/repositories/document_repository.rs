use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::documents::models::Document;

/// Persistence of document metadata records.
///
/// Implementations must be `Send + Sync`; one instance is shared by the
/// request path and both background workers.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert a new document row
    async fn save(&self, document: &Document) -> Result<()>;

    /// Fetch a document by id, `NotFound` if no row matches
    async fn find_by_id(&self, id: Uuid) -> Result<Document>;

    /// All documents, newest `created_at` first
    async fn find_all(&self) -> Result<Vec<Document>>;

    /// Remove a document row, `NotFound` if it was already gone
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Documents whose `expires_at` is at or before `now`
    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Document>>;

    /// Cheap connectivity probe
    async fn ping(&self) -> Result<()>;
}

/// Postgres-backed metadata store
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataStore for PgDocumentStore {
    async fn save(&self, document: &Document) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, file_name, file_size, content_type, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(document.id)
        .bind(&document.file_name)
        .bind(document.file_size)
        .bind(&document.content_type)
        .bind(document.created_at)
        .bind(document.expires_at)
        .execute(&self.pool)
        .await?;

        debug!(document_id = %document.id, "Document row inserted");
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Document> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, file_name, file_size, content_type, created_at, expires_at
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        document.ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))
    }

    async fn find_all(&self) -> Result<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, file_name, file_size, content_type, created_at, expires_at
            FROM documents
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        // Row-level atomicity decides concurrent deletes; the loser sees zero rows
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Document {} not found", id)));
        }

        debug!(document_id = %id, "Document row deleted");
        Ok(())
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, file_name, file_size, content_type, created_at, expires_at
            FROM documents
            WHERE expires_at IS NOT NULL AND expires_at <= $1
            ORDER BY expires_at ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
