// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single worker: reserve, run, record, acknowledge.
//!
//! Each job goes through the same steps:
//!
//! 1. Skip (and ack) jobs whose record is already final
//! 2. Best-effort STARTED write
//! 3. Run the handler on the blocking pool while renewing leases
//! 4. Conditional SUCCESS / RETRY / FAILURE write
//! 5. Ack, or defer for a retry
//!
//! Store or broker failures leave the message unacknowledged, so the broker
//! redelivers it once the lease expires. A message is only acked once its
//! record is final or its retry has been deferred.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use errand_adapters::{Broker, BrokerError, ResultStore, StoreError, UpdateOutcome};
use errand_core::handler::DynHandler;
use errand_core::{
    Clock, HandlerError, HandlerRegistry, JobId, JobRequest, RetryDecision, RetryPolicy,
    StatusUpdate, TaskInfo, WorkerLoad,
};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Ping reply
pub const PONG: &str = "pong";

/// Requests answered by a worker between (and during) jobs.
#[derive(Debug)]
pub enum Control {
    Ping(oneshot::Sender<String>),
    Inspect(oneshot::Sender<WorkerLoad>),
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Messages leased ahead of the one executing
    pub prefetch: usize,
    pub poll_interval: Duration,
    pub visibility_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            prefetch: 1,
            poll_interval: Duration::from_millis(200),
            visibility_timeout: Duration::from_secs(300),
            retry: RetryPolicy::default(),
        }
    }
}

/// Shared services a worker talks to.
#[derive(Clone)]
pub struct WorkerDeps {
    pub broker: Arc<dyn Broker>,
    pub store: Arc<dyn ResultStore>,
    pub registry: HandlerRegistry,
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Broker(#[from] BrokerError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Worker<C: Clock> {
    id: String,
    deps: WorkerDeps,
    config: WorkerConfig,
    clock: C,
    control: mpsc::Receiver<Control>,
    shutdown: CancellationToken,
    reserved: VecDeque<JobRequest>,
}

impl<C: Clock> Worker<C> {
    pub fn new(
        id: impl Into<String>,
        deps: WorkerDeps,
        config: WorkerConfig,
        clock: C,
        control: mpsc::Receiver<Control>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            id: id.into(),
            deps,
            config,
            clock,
            control,
            shutdown,
            reserved: VecDeque::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Work until the shutdown token fires. A job already executing runs to
    /// completion first.
    pub async fn run(mut self) {
        info!(worker = %self.id, prefetch = self.config.prefetch, "worker started");
        while !self.shutdown.is_cancelled() {
            if let Err(e) = self.fill().await {
                warn!(worker = %self.id, error = %e, "reserve failed");
            }
            if let Some(request) = self.reserved.pop_front() {
                self.process(request).await;
                continue;
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                Some(msg) = self.control.recv() => self.answer(msg, None),
                _ = self.deps.broker.wait_for_message(self.config.poll_interval) => {}
            }
        }
        info!(worker = %self.id, unstarted = self.reserved.len(), "worker stopped");
    }

    /// Lease messages until one is executing-ready and `prefetch` more wait.
    async fn fill(&mut self) -> Result<(), BrokerError> {
        while self.reserved.len() <= self.config.prefetch {
            match self.deps.broker.reserve(&self.id).await? {
                Some(request) => {
                    debug!(worker = %self.id, job_id = %request.job_id, "reserved");
                    self.reserved.push_back(request);
                }
                None => break,
            }
        }
        Ok(())
    }

    /// Take one delivery through to ack or defer, logging anything that
    /// leaves it unacknowledged.
    pub(crate) async fn process(&mut self, request: JobRequest) {
        let job_id = request.job_id.clone();
        if let Err(e) = self.execute(request).await {
            warn!(worker = %self.id, %job_id, error = %e, "job left unacknowledged");
        }
    }

    async fn execute(&mut self, request: JobRequest) -> Result<(), WorkerError> {
        let job_id = request.job_id.clone();
        let existing = self.deps.store.get(&job_id).await?;
        if let Some(record) = &existing {
            if record.status.is_final() {
                debug!(%job_id, status = %record.status, "skipping settled job");
                self.deps.broker.ack(&job_id).await?;
                return Ok(());
            }
        }

        let prior_attempts = existing.map(|r| r.attempts).unwrap_or(0);
        let started =
            StatusUpdate::Started { worker: self.id.clone(), at_ms: self.clock.epoch_ms() };
        let attempts = match self.deps.store.update(&job_id, started).await {
            Ok(UpdateOutcome::Applied(record)) => record.attempts,
            Ok(UpdateOutcome::Rejected(record)) if record.status.is_final() => {
                debug!(%job_id, status = %record.status, "settled before start");
                self.deps.broker.ack(&job_id).await?;
                return Ok(());
            }
            Ok(UpdateOutcome::Rejected(record)) => record.attempts.max(prior_attempts + 1),
            Err(e) => {
                warn!(worker = %self.id, %job_id, error = %e, "could not record start");
                prior_attempts + 1
            }
        };

        let Some(handler) = self.deps.registry.get(&request.handler) else {
            let error = format!("unknown handler: {}", request.handler);
            warn!(worker = %self.id, %job_id, %error, "job failed");
            let at_ms = self.clock.epoch_ms();
            return self.settle(&job_id, StatusUpdate::Failure { error, at_ms }).await;
        };

        info!(
            worker = %self.id,
            %job_id,
            handler = %request.handler,
            attempt = attempts,
            "job started"
        );
        let payload = request.payload.clone();
        let task = tokio::task::spawn_blocking(move || handler.invoke(payload));
        let outcome = self.supervise(&request, task).await;

        match outcome {
            Ok(result) => {
                info!(worker = %self.id, %job_id, "job succeeded");
                let at_ms = self.clock.epoch_ms();
                self.settle(&job_id, StatusUpdate::Success { result, at_ms }).await
            }
            Err(error) => self.handle_failure(&job_id, attempts, error).await,
        }
    }

    async fn handle_failure(
        &self,
        job_id: &JobId,
        attempts: u32,
        error: HandlerError,
    ) -> Result<(), WorkerError> {
        let at_ms = self.clock.epoch_ms();
        match self.config.retry.decide(attempts, &error) {
            RetryDecision::Retry { delay } => {
                info!(
                    worker = %self.id,
                    %job_id,
                    attempt = attempts,
                    error = %error,
                    ?delay,
                    "job will retry"
                );
                let update = StatusUpdate::Retry { error: error.to_string(), at_ms };
                let outcome = match self.deps.store.update(job_id, update.clone()).await? {
                    UpdateOutcome::Rejected(record) if !record.status.is_final() => {
                        // The STARTED write for this attempt never landed
                        debug!(%job_id, status = %record.status, "recording start before retry");
                        let started = StatusUpdate::Started { worker: self.id.clone(), at_ms };
                        match self.deps.store.update(job_id, started).await? {
                            UpdateOutcome::Applied(_) => {
                                self.deps.store.update(job_id, update).await?
                            }
                            rejected => rejected,
                        }
                    }
                    outcome => outcome,
                };
                match outcome {
                    UpdateOutcome::Applied(_) => {
                        let not_before_ms = at_ms + delay.as_millis() as u64;
                        self.deps.broker.defer(job_id, &self.id, not_before_ms).await?;
                    }
                    UpdateOutcome::Rejected(record) if record.status.is_final() => {
                        debug!(%job_id, status = %record.status, "retry write refused");
                        self.deps.broker.ack(job_id).await?;
                    }
                    UpdateOutcome::Rejected(record) => {
                        warn!(
                            worker = %self.id,
                            %job_id,
                            status = %record.status,
                            "retry not recorded; awaiting redelivery"
                        );
                    }
                }
                Ok(())
            }
            RetryDecision::GiveUp => {
                warn!(worker = %self.id, %job_id, attempts, error = %error, "job failed");
                self.settle(job_id, StatusUpdate::Failure { error: error.to_string(), at_ms }).await
            }
        }
    }

    /// Terminal write, then ack. A refused write means another delivery got
    /// there first; the message is acked either way.
    async fn settle(&self, job_id: &JobId, update: StatusUpdate) -> Result<(), WorkerError> {
        if let UpdateOutcome::Rejected(record) = self.deps.store.update(job_id, update).await? {
            debug!(worker = %self.id, %job_id, status = %record.status, "result already recorded");
        }
        self.deps.broker.ack(job_id).await?;
        Ok(())
    }

    /// Wait for the handler while answering control requests and keeping
    /// the leases of the active and reserved messages alive.
    async fn supervise(
        &mut self,
        request: &JobRequest,
        mut task: JoinHandle<Result<serde_json::Value, HandlerError>>,
    ) -> Result<serde_json::Value, HandlerError> {
        let period = (self.config.visibility_timeout / 2).max(Duration::from_millis(10));
        let mut renew = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        loop {
            tokio::select! {
                joined = &mut task => {
                    return joined.unwrap_or_else(|e| {
                        warn!(job_id = %request.job_id, error = %e, "handler panicked");
                        Err(HandlerError::Fatal("handler panicked".to_string()))
                    });
                }
                Some(msg) = self.control.recv() => self.answer(msg, Some(request)),
                _ = renew.tick() => self.renew_leases(&request.job_id).await,
            }
        }
    }

    async fn renew_leases(&self, active: &JobId) {
        let ids = std::iter::once(active).chain(self.reserved.iter().map(|r| &r.job_id));
        for job_id in ids {
            match self.deps.broker.extend(job_id, &self.id).await {
                Ok(true) => {}
                Ok(false) => warn!(worker = %self.id, %job_id, "lease lost"),
                Err(e) => warn!(worker = %self.id, %job_id, error = %e, "lease renewal failed"),
            }
        }
    }

    fn answer(&self, msg: Control, active: Option<&JobRequest>) {
        match msg {
            Control::Ping(reply) => {
                let _ = reply.send(PONG.to_string());
            }
            Control::Inspect(reply) => {
                let load = WorkerLoad {
                    active: active.into_iter().map(task_info).collect(),
                    reserved: self.reserved.iter().map(task_info).collect(),
                    scheduled: Vec::new(),
                };
                let _ = reply.send(load);
            }
        }
    }
}

fn task_info(request: &JobRequest) -> TaskInfo {
    TaskInfo::new(request.job_id.clone(), &request.handler)
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
