// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet health: who is alive and what they hold.

use std::sync::Arc;
use std::time::Duration;

use errand_adapters::{FleetControl, FleetError};
use errand_core::FleetSnapshot;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("fleet monitor unavailable: {0}")]
    Unavailable(String),
}

impl From<FleetError> for MonitorError {
    fn from(e: FleetError) -> Self {
        match e {
            FleetError::Unavailable(msg) => MonitorError::Unavailable(msg),
        }
    }
}

pub struct FleetMonitor {
    fleet: Arc<dyn FleetControl>,
    ping_timeout: Duration,
}

impl FleetMonitor {
    pub fn new(fleet: Arc<dyn FleetControl>, ping_timeout: Duration) -> Self {
        Self { fleet, ping_timeout }
    }

    /// Ping the fleet and collect per-worker loads.
    ///
    /// Healthy means at least one worker answered within the ping timeout.
    /// Loads are reported only for workers that answered.
    pub async fn health(&self) -> Result<FleetSnapshot, MonitorError> {
        let workers = self.fleet.ping(self.ping_timeout).await.inspect_err(|e| {
            warn!(error = %e, "fleet ping failed");
        })?;
        let mut tasks = self.fleet.inspect(self.ping_timeout).await?;
        tasks.retain(|worker, _| workers.contains_key(worker));

        let snapshot = FleetSnapshot::from_parts(workers, tasks);
        debug!(
            healthy = snapshot.healthy,
            workers = snapshot.workers.len(),
            jobs = snapshot.queue_counts.total(),
            "fleet health"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
