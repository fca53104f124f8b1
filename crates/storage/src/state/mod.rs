// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

mod queue;

pub use queue::QueuedMessage;

use errand_core::{Event, JobId, JobRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Queue and result-store contents derived from the event log.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterializedState {
    /// Result store: job id → record
    #[serde(default)]
    pub records: HashMap<JobId, JobRecord>,
    /// Broker queue in delivery order
    #[serde(default)]
    pub queue: Vec<QueuedMessage>,
}

impl MaterializedState {
    pub fn record(&self, job_id: &str) -> Option<&JobRecord> {
        self.records.get(job_id)
    }

    /// Apply an event to derive state changes.
    ///
    /// Events are applied once each, in sequence order: live mutations
    /// apply right after their WAL append, and recovery replays only the
    /// entries after the snapshot's sequence number. Every event was
    /// checked against current state before it was logged, so a rejected
    /// transition here means the log and state disagree; it is logged and
    /// skipped.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::JobPublished { request, at_ms } => {
                self.records
                    .entry(request.job_id.clone())
                    .or_insert_with(|| JobRecord::pending(request.job_id.clone(), *at_ms));
                if self.position(&request.job_id).is_none() {
                    self.queue.push(QueuedMessage::new(request.clone()));
                }
            }

            Event::JobUpdated { job_id, update } => {
                let record = self
                    .records
                    .entry(job_id.clone())
                    .or_insert_with(|| JobRecord::pending(job_id.clone(), update_time(update)));
                if let Err(e) = record.apply(update) {
                    warn!(error = %e, "skipping inconsistent status update");
                }
            }

            Event::JobDeferred { job_id, worker, not_before_ms } => {
                if let Some(pos) = self.position(job_id) {
                    let mut message = self.queue.remove(pos);
                    message.not_before_ms = Some(*not_before_ms);
                    message.origin_worker = Some(worker.clone());
                    self.queue.push(message);
                }
            }

            Event::JobAcked { job_id } => {
                self.queue.retain(|m| &m.request.job_id != job_id);
            }

            Event::RecordPurged { job_id } => {
                self.records.remove(job_id);
            }
        }
    }

    /// Settled records whose final write happened before `cutoff_ms`.
    pub fn expired_records(&self, cutoff_ms: u64) -> Vec<JobId> {
        let mut expired: Vec<_> = self
            .records
            .values()
            .filter(|r| r.settled_at_ms().is_some_and(|at| at < cutoff_ms))
            .map(|r| r.job_id.clone())
            .collect();
        expired.sort();
        expired
    }
}

fn update_time(update: &errand_core::StatusUpdate) -> u64 {
    use errand_core::StatusUpdate::*;
    match update {
        Started { at_ms, .. }
        | Retry { at_ms, .. }
        | Success { at_ms, .. }
        | Failure { at_ms, .. }
        | Revoked { at_ms } => *at_ms,
    }
}

#[cfg(test)]
#[path = "../state_tests.rs"]
mod tests;
