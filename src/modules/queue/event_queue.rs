use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::core::error::Result;

/// A message received from the queue together with the handle that acknowledges it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub body: String,
    pub receipt_handle: String,
}

/// At-least-once transport for serialized lifecycle events.
#[async_trait]
pub trait EventQueue: Send + Sync {
    /// Send one serialized event
    async fn publish(&self, body: &str) -> Result<()>;

    /// Long-poll for one batch. An empty batch means the wait elapsed with nothing to deliver.
    async fn receive(&self) -> Result<Vec<QueueMessage>>;

    /// Acknowledge a received message so it is never redelivered
    async fn delete_message(&self, receipt_handle: &str) -> Result<()>;

    /// Cheap connectivity probe
    async fn ping(&self) -> Result<()>;
}

/// Adapt [`EventQueue::receive`] into a lazy stream of messages.
///
/// The stream is infinite until `cancel` fires and then ends for good. A failed
/// receive yields a single `Err` and polling carries on with the next batch.
/// Messages still buffered at cancellation are dropped unacknowledged and
/// become eligible for redelivery.
pub fn consume(
    queue: Arc<dyn EventQueue>,
    cancel: CancellationToken,
) -> BoxStream<'static, Result<QueueMessage>> {
    let state = (queue, cancel, VecDeque::new());

    futures::stream::unfold(state, |(queue, cancel, mut buffered)| async move {
        loop {
            if cancel.is_cancelled() {
                return None;
            }
            if let Some(message) = buffered.pop_front() {
                return Some((Ok(message), (queue, cancel, buffered)));
            }

            let received = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                received = queue.receive() => received,
            };

            match received {
                Ok(batch) => buffered.extend(batch),
                Err(e) => return Some((Err(e), (queue, cancel, buffered))),
            }
        }
    })
    .fuse()
    .boxed()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::modules::queue::memory::{InMemoryQueue, QueueOp};
    use crate::shared::test_helpers::Fault;

    #[tokio::test]
    async fn test_consume_yields_published_messages_in_order() {
        let queue = Arc::new(InMemoryQueue::new());
        queue.publish("first").await.unwrap();
        queue.publish("second").await.unwrap();

        let cancel = CancellationToken::new();
        let mut stream = consume(queue.clone(), cancel.clone());

        let first = assert_ok!(stream.next().await.unwrap());
        let second = assert_ok!(stream.next().await.unwrap());
        assert_eq!(first.body, "first");
        assert_eq!(second.body, "second");
        assert_ne!(first.receipt_handle, second.receipt_handle);
    }

    #[tokio::test]
    async fn test_consume_surfaces_receive_error_and_continues() {
        let queue = Arc::new(InMemoryQueue::new());
        queue.inject(QueueOp::Receive, Fault::Fail);

        let cancel = CancellationToken::new();
        let mut stream = consume(queue.clone(), cancel.clone());

        assert_err!(stream.next().await.unwrap());

        queue.clear(QueueOp::Receive);
        queue.publish("after-blip").await.unwrap();
        let message = assert_ok!(stream.next().await.unwrap());
        assert_eq!(message.body, "after-blip");
    }

    #[tokio::test]
    async fn test_consume_ends_after_cancellation() {
        let queue = Arc::new(InMemoryQueue::new());
        let cancel = CancellationToken::new();
        let mut stream = consume(queue.clone(), cancel.clone());

        cancel.cancel();
        let next = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("stream should end promptly");
        assert!(next.is_none());

        queue.publish("late").await.unwrap();
        assert!(stream.next().await.is_none());
        assert!(stream.next().await.is_none());
        assert_eq!(queue.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_long_poll() {
        let queue = Arc::new(InMemoryQueue::with_wait_time(Duration::from_secs(60)));
        let cancel = CancellationToken::new();
        let mut stream = consume(queue, cancel.clone());

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let next = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("long poll should be abandoned on cancel");
        assert!(next.is_none());
    }
}
