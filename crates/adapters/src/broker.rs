// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;
use errand_core::{JobId, JobRequest, TaskInfo};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Errors from broker operations
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Transport or persistence failure; nothing was changed
    #[error("broker unavailable: {0}")]
    Unavailable(String),
}

/// Durable FIFO transport with at-least-once delivery.
///
/// A reserved message is leased to one worker and hidden from the others
/// until it is acknowledged, deferred, or the visibility timeout lapses.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Enqueue a request. Publishing an id that is already queued is a no-op.
    async fn publish(&self, request: JobRequest) -> Result<(), BrokerError>;

    /// Lease the next due message to `worker`.
    async fn reserve(&self, worker: &str) -> Result<Option<JobRequest>, BrokerError>;

    /// Renew `worker`'s lease. False when the lease was lost.
    async fn extend(&self, job_id: &JobId, worker: &str) -> Result<bool, BrokerError>;

    /// Remove the message for good.
    async fn ack(&self, job_id: &JobId) -> Result<(), BrokerError>;

    /// Return the message to the back of the queue, due at `not_before_ms`.
    async fn defer(&self, job_id: &JobId, worker: &str, not_before_ms: u64)
        -> Result<(), BrokerError>;

    /// Drop a queued message (revocation). False when it was not queued.
    async fn discard(&self, job_id: &JobId) -> Result<bool, BrokerError>;

    /// Deferred messages grouped by the worker that deferred them.
    async fn scheduled(&self) -> Result<BTreeMap<String, Vec<TaskInfo>>, BrokerError>;

    /// Messages held by the broker, leased or not.
    async fn depth(&self) -> Result<usize, BrokerError>;

    /// Wait until a message may be available, or `timeout` passes.
    async fn wait_for_message(&self, timeout: Duration);
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{Broker, BrokerError};
    use async_trait::async_trait;
    use errand_core::{JobId, JobRequest, TaskInfo};
    use parking_lot::Mutex;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeBrokerState {
        queue: VecDeque<JobRequest>,
        published: Vec<JobRequest>,
        acked: Vec<JobId>,
        deferred: Vec<(JobId, String, u64)>,
        offline: bool,
    }

    /// In-memory broker that records every call.
    ///
    /// `set_offline(true)` makes every operation fail with `Unavailable`.
    #[derive(Clone, Default)]
    pub struct FakeBroker {
        inner: Arc<Mutex<FakeBrokerState>>,
    }

    impl FakeBroker {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_offline(&self, offline: bool) {
            self.inner.lock().offline = offline;
        }

        /// Every request ever published, in order
        pub fn published(&self) -> Vec<JobRequest> {
            self.inner.lock().published.clone()
        }

        pub fn acked(&self) -> Vec<JobId> {
            self.inner.lock().acked.clone()
        }

        pub fn deferred(&self) -> Vec<(JobId, String, u64)> {
            self.inner.lock().deferred.clone()
        }

        fn check(&self) -> Result<(), BrokerError> {
            if self.inner.lock().offline {
                return Err(BrokerError::Unavailable("connection refused".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Broker for FakeBroker {
        async fn publish(&self, request: JobRequest) -> Result<(), BrokerError> {
            self.check()?;
            let mut inner = self.inner.lock();
            inner.published.push(request.clone());
            inner.queue.push_back(request);
            Ok(())
        }

        async fn reserve(&self, _worker: &str) -> Result<Option<JobRequest>, BrokerError> {
            self.check()?;
            Ok(self.inner.lock().queue.pop_front())
        }

        async fn extend(&self, _job_id: &JobId, _worker: &str) -> Result<bool, BrokerError> {
            self.check()?;
            Ok(true)
        }

        async fn ack(&self, job_id: &JobId) -> Result<(), BrokerError> {
            self.check()?;
            self.inner.lock().acked.push(job_id.clone());
            Ok(())
        }

        async fn defer(
            &self,
            job_id: &JobId,
            worker: &str,
            not_before_ms: u64,
        ) -> Result<(), BrokerError> {
            self.check()?;
            self.inner.lock().deferred.push((job_id.clone(), worker.to_string(), not_before_ms));
            Ok(())
        }

        async fn discard(&self, job_id: &JobId) -> Result<bool, BrokerError> {
            self.check()?;
            let mut inner = self.inner.lock();
            let before = inner.queue.len();
            inner.queue.retain(|r| &r.job_id != job_id);
            Ok(inner.queue.len() != before)
        }

        async fn scheduled(&self) -> Result<BTreeMap<String, Vec<TaskInfo>>, BrokerError> {
            self.check()?;
            Ok(BTreeMap::new())
        }

        async fn depth(&self) -> Result<usize, BrokerError> {
            self.check()?;
            Ok(self.inner.lock().queue.len())
        }

        async fn wait_for_message(&self, timeout: Duration) {
            tokio::time::sleep(timeout).await;
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeBroker;
