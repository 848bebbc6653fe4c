//! Modules layer - Infrastructure components for external integrations
//!
//! Contains clients and adapters for object storage and the event queue.

pub mod queue;
pub mod storage;
