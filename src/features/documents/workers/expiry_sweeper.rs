use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::error::{AppError, Result};
use crate::features::documents::services::DocumentService;

/// Tally of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub found: usize,
    pub expired: usize,
    /// Removed by someone else between the scan and our delete
    pub already_gone: usize,
    pub failed: usize,
}

/// Expiry sweeper worker that runs in the background
/// Removes documents whose expiry has passed through the service's removal path
pub struct ExpirySweeper {
    service: Arc<DocumentService>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(service: Arc<DocumentService>, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Run the sweeper until `cancel` fires.
    ///
    /// Cancellation is observed between ticks; a sweep in progress runs to completion.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!("Starting expiry sweeper worker (interval: {:?})", self.interval);

        let mut interval = interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            match self.sweep(Utc::now()).await {
                Ok(outcome) if outcome.found > 0 => {
                    tracing::info!(
                        "Expiry sweep: found={}, expired={}, already_gone={}, failed={}",
                        outcome.found,
                        outcome.expired,
                        outcome.already_gone,
                        outcome.failed
                    );
                }
                Ok(_) => tracing::debug!("Expiry sweep: nothing to expire"),
                Err(e) => tracing::error!("Expiry sweep aborted, retrying next tick: {}", e),
            }
        }

        tracing::info!("Expiry sweeper stopped");
    }

    /// Expire every document due at `now`.
    ///
    /// Only a failed scan is an error. Each document is handled on its own and
    /// its failure is logged and counted.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepOutcome> {
        let documents = self.service.find_expired(now).await?;

        let mut outcome = SweepOutcome {
            found: documents.len(),
            ..SweepOutcome::default()
        };

        for document in documents {
            match self.service.expire(document.id).await {
                Ok(()) => outcome.expired += 1,
                Err(AppError::NotFound(_)) => {
                    tracing::debug!(document_id = %document.id, "Expired document already removed");
                    outcome.already_gone += 1;
                }
                Err(e) if e.is_unavailable() => {
                    tracing::error!(
                        document_id = %document.id,
                        "Failed to expire document '{}': {}", document.file_name, e
                    );
                    outcome.failed += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        document_id = %document.id,
                        "Skipping expiry of document '{}': {}", document.file_name, e
                    );
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }
}
