use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::error::{AppError, Result};

/// Database model for document metadata
///
/// Documents are immutable once created. A row only exists if its blob was
/// written first, and the row's absence is what makes a document gone.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Document {
    pub id: Uuid,
    /// Logical key into the blob store
    pub file_name: String,
    /// Byte length declared at upload time
    pub file_size: i64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    /// `None` means the document never expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Build a new document record with a fresh time-ordered id.
    ///
    /// `expires_in_seconds` sets `expires_at = created_at + seconds` when
    /// positive; zero, negative or absent means no expiry.
    pub fn new(
        file_name: impl Into<String>,
        file_size: i64,
        content_type: impl Into<String>,
        created_at: DateTime<Utc>,
        expires_in_seconds: Option<i64>,
    ) -> Result<Self> {
        let expires_at = match expires_in_seconds {
            Some(secs) if secs > 0 => {
                let ttl = Duration::try_seconds(secs).ok_or_else(|| {
                    AppError::InvalidInput(format!("Expiry of {} seconds is out of range", secs))
                })?;
                let at = created_at.checked_add_signed(ttl).ok_or_else(|| {
                    AppError::InvalidInput(format!("Expiry of {} seconds is out of range", secs))
                })?;
                Some(at)
            }
            _ => None,
        };

        let document = Self {
            id: Uuid::now_v7(),
            file_name: file_name.into(),
            file_size,
            content_type: content_type.into(),
            created_at,
            expires_at,
        };
        document.validate()?;
        Ok(document)
    }

    /// Check the record-level invariants
    pub fn validate(&self) -> Result<()> {
        if self.file_name.trim().is_empty() {
            return Err(AppError::InvalidInput("File name must not be empty".to_string()));
        }
        if self.file_size < 0 {
            return Err(AppError::InvalidInput(format!(
                "File size must not be negative, got {}",
                self.file_size
            )));
        }
        if let Some(expires_at) = self.expires_at {
            if expires_at <= self.created_at {
                return Err(AppError::InvalidInput(
                    "Expiry must be later than creation time".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Whether the document is due for removal at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}
