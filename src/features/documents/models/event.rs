use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::documents::models::Document;

/// Lifecycle transition carried by a [`DocumentEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Created,
    Deleted,
    Expired,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Created => "created",
            EventType::Deleted => "deleted",
            EventType::Expired => "expired",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle notification sent through the event queue.
///
/// Events are informational: consumers must tolerate duplicates and gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEvent {
    pub document_id: Uuid,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub file_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl DocumentEvent {
    pub fn for_document(document: &Document, event_type: EventType) -> Self {
        Self {
            document_id: document.id,
            event_type,
            file_name: document.file_name.clone(),
            timestamp: Utc::now(),
            content_type: Some(document.content_type.clone()),
        }
    }
}
