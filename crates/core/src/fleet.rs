// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-in-time view of the worker fleet and its queues.
//!
//! Built fresh on every health query and never persisted.

use crate::job::JobId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A job as seen by fleet introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub job_id: JobId,
    pub handler: String,
    /// Earliest delivery time, for scheduled (retry-delayed) jobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_ms: Option<u64>,
}

impl TaskInfo {
    pub fn new(job_id: JobId, handler: impl Into<String>) -> Self {
        Self { job_id, handler: handler.into(), eta_ms: None }
    }

    pub fn with_eta(mut self, eta_ms: u64) -> Self {
        self.eta_ms = Some(eta_ms);
        self
    }
}

/// Jobs attributed to one worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerLoad {
    /// Currently executing
    #[serde(default)]
    pub active: Vec<TaskInfo>,
    /// Leased, waiting for an execution slot
    #[serde(default)]
    pub reserved: Vec<TaskInfo>,
    /// Deferred with a not-before time
    #[serde(default)]
    pub scheduled: Vec<TaskInfo>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub active: usize,
    pub reserved: usize,
    pub scheduled: usize,
}

impl QueueCounts {
    pub fn from_loads<'a>(loads: impl IntoIterator<Item = &'a WorkerLoad>) -> Self {
        loads.into_iter().fold(Self::default(), |acc, load| Self {
            active: acc.active + load.active.len(),
            reserved: acc.reserved + load.reserved.len(),
            scheduled: acc.scheduled + load.scheduled.len(),
        })
    }

    pub fn total(&self) -> usize {
        self.active + self.reserved + self.scheduled
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSnapshot {
    /// At least one worker answered the ping
    pub healthy: bool,
    /// Worker id → ping reply, responsive workers only
    pub workers: BTreeMap<String, String>,
    pub queue_counts: QueueCounts,
    pub tasks: BTreeMap<String, WorkerLoad>,
}

impl FleetSnapshot {
    /// Assemble a snapshot from ping replies and per-worker loads.
    ///
    /// Health is best-effort liveness: one reply is enough.
    pub fn from_parts(
        workers: BTreeMap<String, String>,
        tasks: BTreeMap<String, WorkerLoad>,
    ) -> Self {
        let queue_counts = QueueCounts::from_loads(tasks.values());
        Self { healthy: !workers.is_empty(), workers, queue_counts, tasks }
    }
}

#[cfg(test)]
#[path = "fleet_tests.rs"]
mod tests;
