use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::documents::models::Document;
use crate::features::documents::repositories::MetadataStore;
use crate::shared::test_helpers::{FailurePlan, Fault};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataOp {
    Save,
    FindById,
    FindAll,
    Delete,
    FindExpired,
    Ping,
}

/// In-memory metadata store for tests
#[derive(Default)]
pub struct InMemoryMetadataStore {
    rows: Mutex<HashMap<Uuid, Document>>,
    writes: AtomicUsize,
    faults: FailurePlan<MetadataOp>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(&self, op: MetadataOp, fault: Fault) {
        self.faults.inject(op, fault);
    }

    pub fn clear(&self, op: MetadataOp) {
        self.faults.clear(op);
    }

    /// Number of successful `save` calls
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.rows.lock().unwrap().contains_key(&id)
    }

    async fn check(&self, op: MetadataOp) -> Result<()> {
        self.faults.check(op, AppError::MetadataUnavailable).await
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn save(&self, document: &Document) -> Result<()> {
        self.check(MetadataOp::Save).await?;
        self.rows
            .lock()
            .unwrap()
            .insert(document.id, document.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Document> {
        self.check(MetadataOp::FindById).await?;
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))
    }

    async fn find_all(&self) -> Result<Vec<Document>> {
        self.check(MetadataOp::FindAll).await?;
        let mut documents: Vec<Document> = self.rows.lock().unwrap().values().cloned().collect();
        documents.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(documents)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.check(MetadataOp::Delete).await?;
        self.rows
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Document>> {
        self.check(MetadataOp::FindExpired).await?;
        let mut expired: Vec<Document> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.is_expired_at(now))
            .cloned()
            .collect();
        expired.sort_by_key(|d| d.expires_at);
        Ok(expired)
    }

    async fn ping(&self) -> Result<()> {
        self.check(MetadataOp::Ping).await
    }
}
