// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process worker fleet and its control channel.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use errand_adapters::{Broker, FleetControl, FleetError};
use errand_core::{Clock, WorkerLoad};
use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::worker::{Control, Worker, WorkerConfig, WorkerDeps};

const CONTROL_BUFFER: usize = 16;

struct WorkerHandle {
    id: String,
    control: mpsc::Sender<Control>,
}

impl WorkerHandle {
    /// Send a control request and wait for the reply. `None` when the
    /// worker is gone, busy past its buffer, or silent past `timeout`.
    async fn ask<T>(
        &self,
        timeout: Duration,
        make: impl FnOnce(oneshot::Sender<T>) -> Control,
    ) -> Option<(String, T)> {
        let (tx, rx) = oneshot::channel();
        self.control.try_send(make(tx)).ok()?;
        let reply = tokio::time::timeout(timeout, rx).await.ok()?.ok()?;
        Some((self.id.clone(), reply))
    }
}

pub struct WorkerPool {
    workers: Vec<WorkerHandle>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    broker: Arc<dyn Broker>,
    shutdown: CancellationToken,
}

impl WorkerPool {
    /// Start `count` workers named `worker-1`, `worker-2`, ...
    pub fn spawn<C: Clock>(count: usize, deps: WorkerDeps, config: WorkerConfig, clock: C) -> Self {
        let shutdown = CancellationToken::new();
        let mut workers = Vec::with_capacity(count);
        let mut tasks = Vec::with_capacity(count);

        for n in 1..=count {
            let id = format!("worker-{}", n);
            let (tx, rx) = mpsc::channel(CONTROL_BUFFER);
            let worker = Worker::new(
                id.clone(),
                deps.clone(),
                config.clone(),
                clock.clone(),
                rx,
                shutdown.child_token(),
            );
            tasks.push(tokio::spawn(worker.run()));
            workers.push(WorkerHandle { id, control: tx });
        }
        info!(count, prefetch = config.prefetch, "worker pool started");

        Self { workers, tasks: Mutex::new(tasks), broker: deps.broker, shutdown }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn worker_ids(&self) -> impl Iterator<Item = &str> {
        self.workers.iter().map(|w| w.id.as_str())
    }

    /// Stop taking new work and wait for running jobs. Workers still busy
    /// after `timeout` are abandoned; their messages are redelivered later.
    /// Returns true when every worker stopped in time.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.shutdown.cancel();
        let tasks = std::mem::take(&mut *self.tasks.lock());
        let aborts: Vec<_> = tasks.iter().map(|t| t.abort_handle()).collect();

        match tokio::time::timeout(timeout, join_all(tasks)).await {
            Ok(_) => {
                info!("worker pool drained");
                true
            }
            Err(_) => {
                warn!(?timeout, "workers still busy after drain timeout, abandoning");
                aborts.iter().for_each(|a| a.abort());
                false
            }
        }
    }

    fn check_running(&self) -> Result<(), FleetError> {
        if self.shutdown.is_cancelled() {
            return Err(FleetError::Unavailable("worker pool is shut down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl FleetControl for WorkerPool {
    async fn ping(&self, timeout: Duration) -> Result<BTreeMap<String, String>, FleetError> {
        self.check_running()?;
        let replies = join_all(self.workers.iter().map(|w| w.ask(timeout, Control::Ping))).await;
        Ok(replies.into_iter().flatten().collect())
    }

    async fn inspect(&self, timeout: Duration) -> Result<BTreeMap<String, WorkerLoad>, FleetError> {
        self.check_running()?;
        let replies =
            join_all(self.workers.iter().map(|w| w.ask(timeout, Control::Inspect))).await;
        let mut loads: BTreeMap<String, WorkerLoad> = replies.into_iter().flatten().collect();

        let scheduled =
            self.broker.scheduled().await.map_err(|e| FleetError::Unavailable(e.to_string()))?;
        for (worker, tasks) in scheduled {
            if let Some(load) = loads.get_mut(&worker) {
                load.scheduled.extend(tasks);
            }
        }
        Ok(loads)
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
