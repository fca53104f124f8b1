// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Submission and revocation.

use std::sync::Arc;

use errand_adapters::{Broker, BrokerError, ResultStore, StoreError, UpdateOutcome};
use errand_core::{Clock, IdGen, JobId, JobRequest, JobStatus, StatusUpdate};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Broker(#[from] BrokerError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a revoke request achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevokeOutcome {
    pub revoked: bool,
    /// Status of the job after the attempt
    pub status: JobStatus,
}

/// Turns caller requests into broker messages.
///
/// Payloads are expected to be validated by the caller against the handler
/// registry; the dispatcher only assigns ids and publishes.
pub struct Dispatcher<C: Clock> {
    broker: Arc<dyn Broker>,
    store: Arc<dyn ResultStore>,
    ids: Arc<dyn IdGen>,
    clock: C,
}

impl<C: Clock> Dispatcher<C> {
    pub fn new(
        broker: Arc<dyn Broker>,
        store: Arc<dyn ResultStore>,
        ids: Arc<dyn IdGen>,
        clock: C,
    ) -> Self {
        Self { broker, store, ids, clock }
    }

    /// Publish a job. The id is returned only once the broker accepted it.
    pub async fn submit(
        &self,
        handler: &str,
        payload: serde_json::Value,
    ) -> Result<JobId, DispatchError> {
        let job_id = JobId::from_string(self.ids.next());
        let request = JobRequest::new(job_id.clone(), handler, payload, self.clock.epoch_ms());
        self.broker.publish(request).await?;
        info!(%job_id, handler, "job submitted");
        Ok(job_id)
    }

    /// Cancel a job that no worker has started.
    ///
    /// Unknown ids are reported as not revoked with status PENDING, the same
    /// answer the resolver gives for them.
    pub async fn revoke(&self, job_id: &JobId) -> Result<RevokeOutcome, DispatchError> {
        if self.store.get(job_id).await?.is_none() {
            debug!(%job_id, "revoke: no such job");
            return Ok(RevokeOutcome { revoked: false, status: JobStatus::Pending });
        }

        let update = StatusUpdate::Revoked { at_ms: self.clock.epoch_ms() };
        match self.store.update(job_id, update).await? {
            UpdateOutcome::Applied(record) => {
                // A worker that reserves it later sees REVOKED and acks.
                let dropped = self.broker.discard(job_id).await?;
                info!(%job_id, dropped, "job revoked");
                Ok(RevokeOutcome { revoked: true, status: record.status })
            }
            UpdateOutcome::Rejected(record) => {
                debug!(%job_id, status = %record.status, "revoke refused");
                Ok(RevokeOutcome { revoked: false, status: record.status })
            }
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
