//! Failure injection and wiring shared by the in-memory collaborator doubles.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::config::WorkerConfig;
use crate::core::error::{AppError, Result};
use crate::features::documents::repositories::memory::InMemoryMetadataStore;
use crate::features::documents::services::DocumentService;
use crate::modules::queue::memory::InMemoryQueue;
use crate::modules::storage::memory::InMemoryBlobStore;

/// What an injected fault does to the targeted operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Return an unavailability error immediately
    Fail,
    /// Never complete, so only a caller-side timeout ends the call
    Stall,
}

/// Per-operation fault switches for a test double
pub struct FailurePlan<Op> {
    failing: Mutex<HashSet<Op>>,
    stalling: Mutex<HashSet<Op>>,
}

impl<Op: Copy + Eq + Hash> Default for FailurePlan<Op> {
    fn default() -> Self {
        Self {
            failing: Mutex::new(HashSet::new()),
            stalling: Mutex::new(HashSet::new()),
        }
    }
}

impl<Op: Copy + Eq + Hash + std::fmt::Debug> FailurePlan<Op> {
    pub fn inject(&self, op: Op, fault: Fault) {
        let set = match fault {
            Fault::Fail => &self.failing,
            Fault::Stall => &self.stalling,
        };
        set.lock().unwrap().insert(op);
    }

    pub fn clear(&self, op: Op) {
        self.failing.lock().unwrap().remove(&op);
        self.stalling.lock().unwrap().remove(&op);
    }

    /// Apply any fault registered for `op`; `make_err` builds the error for [`Fault::Fail`].
    pub async fn check(&self, op: Op, make_err: impl FnOnce(String) -> AppError) -> Result<()> {
        let stall = self.stalling.lock().unwrap().contains(&op);
        if stall {
            std::future::pending::<()>().await;
        }
        let fail = self.failing.lock().unwrap().contains(&op);
        if fail {
            return Err(make_err(format!("injected failure on {:?}", op)));
        }
        Ok(())
    }
}

/// A [`DocumentService`] wired to in-memory collaborators that tests can poke at
pub struct DocumentHarness {
    pub service: Arc<DocumentService>,
    pub metadata: Arc<InMemoryMetadataStore>,
    pub blobs: Arc<InMemoryBlobStore>,
    pub queue: Arc<InMemoryQueue>,
}

impl DocumentHarness {
    pub fn new() -> Self {
        Self::with_config(WorkerConfig::default())
    }

    /// Short collaborator and health timeouts so stalled doubles fail fast
    pub fn with_timeouts(limit: Duration) -> Self {
        Self::with_config(WorkerConfig {
            health_check_timeout: limit,
            collaborator_timeout: limit,
            transfer_timeout: limit,
            ..WorkerConfig::default()
        })
    }

    pub fn with_config(config: WorkerConfig) -> Self {
        let metadata = Arc::new(InMemoryMetadataStore::new());
        let blobs = Arc::new(InMemoryBlobStore::new());
        let queue = Arc::new(InMemoryQueue::new());
        let service = Arc::new(DocumentService::new(
            metadata.clone(),
            blobs.clone(),
            queue.clone(),
            &config,
        ));

        Self {
            service,
            metadata,
            blobs,
            queue,
        }
    }
}
