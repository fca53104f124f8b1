// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{Lease, LocalBackend};
use crate::broker::{Broker, BrokerError};
use async_trait::async_trait;
use errand_core::{Clock, Event, JobId, JobRequest, TaskInfo};
use errand_storage::WalError;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

fn unavailable(e: WalError) -> BrokerError {
    BrokerError::Unavailable(e.to_string())
}

#[async_trait]
impl<C: Clock> Broker for LocalBackend<C> {
    async fn publish(&self, request: JobRequest) -> Result<(), BrokerError> {
        {
            let mut store = self.store.lock();
            if store.state.queued(&request.job_id).is_some() {
                return Ok(());
            }
            let at_ms = self.clock.epoch_ms();
            store.commit(Event::JobPublished { request, at_ms }).map_err(unavailable)?;
        }
        self.ready.notify_one();
        Ok(())
    }

    async fn reserve(&self, worker: &str) -> Result<Option<JobRequest>, BrokerError> {
        let now = self.clock.now();
        let now_ms = self.clock.epoch_ms();
        let mut store = self.store.lock();
        store.expire_leases(now);

        let leases = &store.leases;
        let Some(message) = store.state.next_ready(now_ms, |id| leases.contains_key(id)) else {
            return Ok(None);
        };
        let request = message.request.clone();
        store.leases.insert(
            request.job_id.clone(),
            Lease { worker: worker.to_string(), expires_at: now + self.visibility_timeout },
        );
        Ok(Some(request))
    }

    async fn extend(&self, job_id: &JobId, worker: &str) -> Result<bool, BrokerError> {
        let now = self.clock.now();
        let mut store = self.store.lock();
        match store.leases.get_mut(job_id) {
            Some(lease) if lease.worker == worker => {
                lease.expires_at = now + self.visibility_timeout;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ack(&self, job_id: &JobId) -> Result<(), BrokerError> {
        let mut store = self.store.lock();
        if store.state.queued(job_id).is_some() {
            store.commit(Event::JobAcked { job_id: job_id.clone() }).map_err(unavailable)?;
        }
        store.leases.remove(job_id);
        Ok(())
    }

    async fn defer(
        &self,
        job_id: &JobId,
        worker: &str,
        not_before_ms: u64,
    ) -> Result<(), BrokerError> {
        let mut store = self.store.lock();
        if store.state.queued(job_id).is_some() {
            store
                .commit(Event::JobDeferred {
                    job_id: job_id.clone(),
                    worker: worker.to_string(),
                    not_before_ms,
                })
                .map_err(unavailable)?;
        }
        store.leases.remove(job_id);
        Ok(())
    }

    async fn discard(&self, job_id: &JobId) -> Result<bool, BrokerError> {
        let mut store = self.store.lock();
        if store.state.queued(job_id).is_none() {
            return Ok(false);
        }
        store.commit(Event::JobAcked { job_id: job_id.clone() }).map_err(unavailable)?;
        if let Some(lease) = store.leases.remove(job_id) {
            info!(%job_id, worker = %lease.worker, "discarded a reserved message");
        }
        Ok(true)
    }

    async fn scheduled(&self) -> Result<BTreeMap<String, Vec<TaskInfo>>, BrokerError> {
        let now_ms = self.clock.epoch_ms();
        let store = self.store.lock();
        let mut by_worker: BTreeMap<String, Vec<TaskInfo>> = BTreeMap::new();
        for message in store.state.deferred(now_ms) {
            let worker = message.origin_worker.clone().unwrap_or_default();
            let mut task = TaskInfo::new(message.job_id().clone(), &message.request.handler);
            if let Some(eta) = message.not_before_ms {
                task = task.with_eta(eta);
            }
            by_worker.entry(worker).or_default().push(task);
        }
        Ok(by_worker)
    }

    async fn depth(&self) -> Result<usize, BrokerError> {
        Ok(self.store.lock().state.queue.len())
    }

    async fn wait_for_message(&self, timeout: Duration) {
        let _ = tokio::time::timeout(timeout, self.ready.notified()).await;
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
