//! AWS SQS event queue
//!
//! Works against real SQS or LocalStack when an endpoint override is configured.

use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::{Message, QueueAttributeName};
use tracing::{debug, info, warn};

use crate::core::config::QueueConfig;
use crate::core::error::{AppError, Result};
use crate::modules::queue::{EventQueue, QueueMessage};

/// SQS-backed [`EventQueue`]
pub struct SqsQueue {
    client: aws_sdk_sqs::Client,
    queue_url: String,
    wait_time_secs: i32,
    max_messages: i32,
}

impl std::fmt::Debug for SqsQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqsQueue")
            .field("queue_url", &self.queue_url)
            .field("wait_time_secs", &self.wait_time_secs)
            .field("max_messages", &self.max_messages)
            .field("client", &"<SqsClient>")
            .finish()
    }
}

impl SqsQueue {
    /// Build an SQS client from the standard AWS credential chain.
    pub async fn new(config: &QueueConfig) -> Self {
        let mut loader =
            aws_config::from_env().region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            debug!(endpoint = %endpoint, "using custom SQS endpoint");
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let client = aws_sdk_sqs::Client::new(&sdk_config);

        info!("SQS queue client initialized for {}", config.queue_url);

        Self::with_client(config, client)
    }

    /// Create an `SqsQueue` with a pre-built client
    pub fn with_client(config: &QueueConfig, client: aws_sdk_sqs::Client) -> Self {
        Self {
            client,
            queue_url: config.queue_url.clone(),
            wait_time_secs: config.wait_time_secs,
            max_messages: config.max_messages,
        }
    }
}

/// A message without a receipt handle can never be acknowledged, so it is skipped
fn to_queue_message(message: &Message) -> Option<QueueMessage> {
    let receipt_handle = message.receipt_handle()?;
    Some(QueueMessage {
        body: message.body().unwrap_or_default().to_string(),
        receipt_handle: receipt_handle.to_string(),
    })
}

#[async_trait]
impl EventQueue for SqsQueue {
    async fn publish(&self, body: &str) -> Result<()> {
        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| {
                AppError::QueueUnavailable(format!(
                    "Failed to publish message: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        debug!(
            message_id = output.message_id().unwrap_or("unknown"),
            "SQS message sent"
        );
        Ok(())
    }

    async fn receive(&self) -> Result<Vec<QueueMessage>> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .wait_time_seconds(self.wait_time_secs)
            .max_number_of_messages(self.max_messages)
            .send()
            .await
            .map_err(|e| {
                AppError::QueueUnavailable(format!(
                    "Failed to receive messages: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let messages = output
            .messages()
            .iter()
            .filter_map(|message| {
                let converted = to_queue_message(message);
                if converted.is_none() {
                    warn!(
                        message_id = message.message_id().unwrap_or("unknown"),
                        "Skipping SQS message without receipt handle"
                    );
                }
                converted
            })
            .collect();

        Ok(messages)
    }

    async fn delete_message(&self, receipt_handle: &str) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| {
                AppError::QueueUnavailable(format!(
                    "Failed to delete message: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .get_queue_attributes()
            .queue_url(&self.queue_url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await
            .map_err(|e| {
                AppError::QueueUnavailable(format!(
                    "Queue unreachable: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }
}
