// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic housekeeping: expire old results and checkpoint state.

use std::sync::Arc;
use std::time::Duration;

use errand_adapters::{LocalBackend, ResultStore, StoreError};
use errand_core::Clock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How often housekeeping runs
pub const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

pub struct Maintenance<C: Clock> {
    backend: Arc<LocalBackend<C>>,
    clock: C,
    result_ttl: Duration,
}

impl<C: Clock> Maintenance<C> {
    pub fn new(backend: Arc<LocalBackend<C>>, clock: C, result_ttl: Duration) -> Self {
        Self { backend, clock, result_ttl }
    }

    /// One pass: purge settled results older than the TTL, then checkpoint.
    /// Returns the number of purged records.
    pub async fn tick(&self) -> Result<usize, StoreError> {
        let cutoff = self.clock.epoch_ms().saturating_sub(self.result_ttl.as_millis() as u64);
        let purged = self.backend.purge_settled_before(cutoff).await?;

        match self.backend.checkpoint() {
            Ok(Some(seq)) => debug!(seq, "checkpoint saved"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "checkpoint failed"),
        }
        Ok(purged)
    }

    /// Run `tick` every `interval` until `shutdown` fires.
    pub fn spawn(self, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut timer = tokio::time::interval_at(start, interval);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = timer.tick() => {
                        if let Err(e) = self.tick().await {
                            warn!(error = %e, "maintenance pass failed");
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
