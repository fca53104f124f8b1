// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::LocalBackend;
use crate::store::{ResultStore, StoreError, UpdateOutcome};
use async_trait::async_trait;
use errand_core::{Clock, Event, JobId, JobRecord, StatusUpdate};
use errand_storage::WalError;
use tracing::{debug, info};

fn unavailable(e: WalError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl<C: Clock> ResultStore for LocalBackend<C> {
    async fn get(&self, job_id: &JobId) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.store.lock().state.record(job_id).cloned())
    }

    async fn update(
        &self,
        job_id: &JobId,
        update: StatusUpdate,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut store = self.store.lock();
        let current = store
            .state
            .record(job_id)
            .cloned()
            .unwrap_or_else(|| JobRecord::pending(job_id.clone(), self.clock.epoch_ms()));

        let mut next = current.clone();
        if let Err(e) = next.apply(&update) {
            debug!(error = %e, "conditional write rejected");
            return Ok(UpdateOutcome::Rejected(current));
        }

        store
            .commit(Event::JobUpdated { job_id: job_id.clone(), update })
            .map_err(unavailable)?;
        let stored = store.state.record(job_id).cloned().unwrap_or(next);
        Ok(UpdateOutcome::Applied(stored))
    }

    async fn purge_settled_before(&self, cutoff_ms: u64) -> Result<usize, StoreError> {
        let mut store = self.store.lock();
        let expired = store.state.expired_records(cutoff_ms);
        for job_id in &expired {
            store.commit(Event::RecordPurged { job_id: job_id.clone() }).map_err(unavailable)?;
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "purged expired results");
        }
        Ok(expired.len())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.store.lock().state.records.len())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
