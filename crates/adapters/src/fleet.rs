// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;
use errand_core::WorkerLoad;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FleetError {
    /// The control channel itself failed (not merely a silent worker)
    #[error("fleet control unavailable: {0}")]
    Unavailable(String),
}

/// Control-plane access to the workers.
#[async_trait]
pub trait FleetControl: Send + Sync {
    /// Ping every worker; only those answering within `timeout` are returned.
    async fn ping(&self, timeout: Duration) -> Result<BTreeMap<String, String>, FleetError>;

    /// Active, reserved and scheduled jobs per responsive worker.
    async fn inspect(&self, timeout: Duration)
        -> Result<BTreeMap<String, WorkerLoad>, FleetError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{FleetControl, FleetError};
    use async_trait::async_trait;
    use errand_core::WorkerLoad;
    use parking_lot::Mutex;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeFleetState {
        replies: BTreeMap<String, String>,
        loads: BTreeMap<String, WorkerLoad>,
        broken: bool,
    }

    /// Scripted fleet: responsive workers and their loads are set by the test.
    #[derive(Clone, Default)]
    pub struct FakeFleet {
        inner: Arc<Mutex<FakeFleetState>>,
    }

    impl FakeFleet {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a worker that answers pings with `reply`.
        pub fn with_worker(self, worker: &str, reply: &str) -> Self {
            self.inner.lock().replies.insert(worker.to_string(), reply.to_string());
            self
        }

        pub fn set_load(&self, worker: &str, load: WorkerLoad) {
            self.inner.lock().loads.insert(worker.to_string(), load);
        }

        /// Make every call fail as a transport error.
        pub fn set_broken(&self, broken: bool) {
            self.inner.lock().broken = broken;
        }

        fn check(&self) -> Result<(), FleetError> {
            if self.inner.lock().broken {
                return Err(FleetError::Unavailable("control channel closed".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl FleetControl for FakeFleet {
        async fn ping(&self, _timeout: Duration) -> Result<BTreeMap<String, String>, FleetError> {
            self.check()?;
            Ok(self.inner.lock().replies.clone())
        }

        async fn inspect(
            &self,
            _timeout: Duration,
        ) -> Result<BTreeMap<String, WorkerLoad>, FleetError> {
            self.check()?;
            let inner = self.inner.lock();
            Ok(inner
                .replies
                .keys()
                .map(|w| (w.clone(), inner.loads.get(w).cloned().unwrap_or_default()))
                .collect())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeFleet;
