//! Event queue module
//!
//! Lifecycle events travel over SQS with at-least-once delivery.

mod event_queue;
#[cfg(test)]
pub mod memory;
mod sqs;

pub use event_queue::{consume, EventQueue, QueueMessage};
pub use sqs::SqsQueue;
