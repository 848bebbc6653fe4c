use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::core::error::{AppError, Result};
use crate::modules::queue::{EventQueue, QueueMessage};
use crate::shared::test_helpers::{FailurePlan, Fault};

const DEFAULT_WAIT: Duration = Duration::from_millis(50);
const MAX_BATCH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueOp {
    Publish,
    Receive,
    DeleteMessage,
    Ping,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<String>,
    in_flight: HashMap<String, String>,
    acked: Vec<String>,
    published: Vec<String>,
    next_receipt: u64,
}

/// In-memory queue for tests.
///
/// Received messages stay in flight until acknowledged;
/// [`InMemoryQueue::redeliver_unacked`] plays the part of a visibility timeout.
pub struct InMemoryQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    wait_time: Duration,
    faults: FailurePlan<QueueOp>,
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::with_wait_time(DEFAULT_WAIT)
    }
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wait_time(wait_time: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            wait_time,
            faults: FailurePlan::default(),
        }
    }

    pub fn inject(&self, op: QueueOp, fault: Fault) {
        self.faults.inject(op, fault);
    }

    pub fn clear(&self, op: QueueOp) {
        self.faults.clear(op);
    }

    /// Every body accepted by `publish`, in order
    pub fn published(&self) -> Vec<String> {
        self.state.lock().unwrap().published.clone()
    }

    /// Bodies acknowledged through `delete_message`, in order
    pub fn acked(&self) -> Vec<String> {
        self.state.lock().unwrap().acked.clone()
    }

    pub fn in_flight_count(&self) -> usize {
        self.state.lock().unwrap().in_flight.len()
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }

    /// Return every unacknowledged in-flight message to the front of the queue
    pub fn redeliver_unacked(&self) {
        let mut state = self.state.lock().unwrap();
        let mut receipts: Vec<String> = state.in_flight.keys().cloned().collect();
        receipts.sort();
        for receipt in receipts.into_iter().rev() {
            if let Some(body) = state.in_flight.remove(&receipt) {
                state.pending.push_front(body);
            }
        }
        drop(state);
        self.notify.notify_one();
    }

    fn take_batch(&self) -> Vec<QueueMessage> {
        let mut state = self.state.lock().unwrap();
        let mut batch = Vec::new();
        while batch.len() < MAX_BATCH {
            let Some(body) = state.pending.pop_front() else {
                break;
            };
            state.next_receipt += 1;
            let receipt_handle = format!("receipt-{:08}", state.next_receipt);
            state.in_flight.insert(receipt_handle.clone(), body.clone());
            batch.push(QueueMessage {
                body,
                receipt_handle,
            });
        }
        batch
    }

    async fn check(&self, op: QueueOp) -> Result<()> {
        self.faults.check(op, AppError::QueueUnavailable).await
    }
}

#[async_trait]
impl EventQueue for InMemoryQueue {
    async fn publish(&self, body: &str) -> Result<()> {
        self.check(QueueOp::Publish).await?;
        {
            let mut state = self.state.lock().unwrap();
            state.pending.push_back(body.to_string());
            state.published.push(body.to_string());
        }
        self.notify.notify_one();
        Ok(())
    }

    async fn receive(&self) -> Result<Vec<QueueMessage>> {
        self.check(QueueOp::Receive).await?;

        let batch = self.take_batch();
        if !batch.is_empty() {
            return Ok(batch);
        }

        // Long poll: wait for a publish or for the wait time to run out
        let _ = tokio::time::timeout(self.wait_time, self.notify.notified()).await;
        Ok(self.take_batch())
    }

    async fn delete_message(&self, receipt_handle: &str) -> Result<()> {
        self.check(QueueOp::DeleteMessage).await?;
        let mut state = self.state.lock().unwrap();
        if let Some(body) = state.in_flight.remove(receipt_handle) {
            state.acked.push(body);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.check(QueueOp::Ping).await
    }
}
