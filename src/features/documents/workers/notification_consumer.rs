use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::core::config::WorkerConfig;
use crate::core::error::{AppError, Result};
use crate::features::documents::models::DocumentEvent;
use crate::modules::queue::{consume, EventQueue, QueueMessage};

/// Side effect attached to each lifecycle event.
///
/// Returning an error leaves the message unacknowledged so the queue redelivers it.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DocumentEvent) -> Result<()>;
}

/// Default handler: records the event in the log
pub struct LoggingEventHandler;

#[async_trait]
impl EventHandler for LoggingEventHandler {
    async fn handle(&self, event: &DocumentEvent) -> Result<()> {
        tracing::info!(
            document_id = %event.document_id,
            event_type = %event.event_type,
            "Document event received: {} at {}",
            event.file_name,
            event.timestamp
        );
        Ok(())
    }
}

/// Notification consumer worker that runs in the background
/// Drains the event queue, acknowledging each message only after it was handled
pub struct NotificationConsumer {
    queue: Arc<dyn EventQueue>,
    handler: Arc<dyn EventHandler>,
    ack_timeout: Duration,
    retry_backoff: Duration,
}

impl NotificationConsumer {
    pub fn new(
        queue: Arc<dyn EventQueue>,
        handler: Arc<dyn EventHandler>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            queue,
            handler,
            ack_timeout: config.collaborator_timeout,
            retry_backoff: config.consumer_retry_backoff,
        }
    }

    /// Consume until `cancel` fires. The message being handled when it fires is finished first.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!("Starting notification consumer worker");

        let mut messages = consume(self.queue.clone(), cancel.clone());

        while let Some(received) = messages.next().await {
            match received {
                Ok(message) => {
                    if let Err(e) = self.process(&message).await {
                        tracing::warn!(
                            receipt_handle = %message.receipt_handle,
                            "Event handling failed, leaving message for redelivery: {}",
                            e
                        );
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to receive events: {}", e);
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.retry_backoff) => {}
                    }
                }
            }
        }

        tracing::info!("Notification consumer stopped");
    }

    /// Handle one message and acknowledge it. Any error means it stays unacknowledged.
    pub async fn process(&self, message: &QueueMessage) -> Result<()> {
        let event: DocumentEvent = serde_json::from_str(&message.body).map_err(|e| {
            AppError::BadRequest(format!("Malformed event payload: {}", e))
        })?;

        self.handler.handle(&event).await?;

        match tokio::time::timeout(
            self.ack_timeout,
            self.queue.delete_message(&message.receipt_handle),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(AppError::QueueUnavailable(format!(
                    "Acknowledgement timed out after {:?}",
                    self.ack_timeout
                )));
            }
        }

        tracing::debug!(
            document_id = %event.document_id,
            "Acknowledged {} event", event.event_type
        );
        Ok(())
    }
}
