// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::handlers::builtin_registry;
use async_trait::async_trait;
use errand_adapters::{FakeBroker, LocalBackend};
use errand_core::test_support::request;
use errand_core::{FakeClock, Handler, JobRecord, JobStatus};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc as std_mpsc;

/// Fails transiently `failures` times, then doubles its input.
struct Flaky {
    failures: AtomicU32,
}

impl Flaky {
    fn failing(failures: u32) -> Self {
        Self { failures: AtomicU32::new(failures) }
    }
}

impl Handler for Flaky {
    type Input = u32;
    type Output = u32;

    fn name(&self) -> &'static str {
        "flaky"
    }

    fn run(&self, n: u32) -> Result<u32, HandlerError> {
        let left = self.failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
            left.checked_sub(1)
        });
        match left {
            Ok(_) => Err(HandlerError::Transient("try later".to_string())),
            Err(_) => Ok(n * 2),
        }
    }
}

struct AlwaysFatal;

impl Handler for AlwaysFatal {
    type Input = serde_json::Value;
    type Output = ();

    fn name(&self) -> &'static str {
        "fatal"
    }

    fn run(&self, _: serde_json::Value) -> Result<(), HandlerError> {
        Err(HandlerError::Fatal("cannot do that".to_string()))
    }
}

struct Panics;

impl Handler for Panics {
    type Input = serde_json::Value;
    type Output = ();

    fn name(&self) -> &'static str {
        "panics"
    }

    fn run(&self, _: serde_json::Value) -> Result<(), HandlerError> {
        panic!("handler blew up")
    }
}

/// Blocks until released through its channel.
struct Gate {
    release: Mutex<std_mpsc::Receiver<()>>,
}

impl Gate {
    fn new() -> (Self, std_mpsc::Sender<()>) {
        let (tx, rx) = std_mpsc::channel();
        (Self { release: Mutex::new(rx) }, tx)
    }
}

impl Handler for Gate {
    type Input = serde_json::Value;
    type Output = ();

    fn name(&self) -> &'static str {
        "gate"
    }

    fn run(&self, _: serde_json::Value) -> Result<(), HandlerError> {
        let _ = self.release.lock().recv();
        Ok(())
    }
}

/// Result store whose STARTED writes fail while `start_failures` is non-zero.
struct StartFailures {
    inner: Arc<LocalBackend<FakeClock>>,
    start_failures: AtomicU32,
}

impl StartFailures {
    fn fail_starts(&self, count: u32) {
        self.start_failures.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl ResultStore for StartFailures {
    async fn get(&self, job_id: &JobId) -> Result<Option<JobRecord>, StoreError> {
        self.inner.get(job_id).await
    }

    async fn update(
        &self,
        job_id: &JobId,
        update: StatusUpdate,
    ) -> Result<UpdateOutcome, StoreError> {
        if matches!(update, StatusUpdate::Started { .. })
            && self
                .start_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok()
        {
            return Err(StoreError::Unavailable("store down".to_string()));
        }
        self.inner.update(job_id, update).await
    }

    async fn purge_settled_before(&self, cutoff_ms: u64) -> Result<usize, StoreError> {
        self.inner.purge_settled_before(cutoff_ms).await
    }

    async fn len(&self) -> Result<usize, StoreError> {
        self.inner.len().await
    }
}

fn registry(flaky_failures: u32) -> HandlerRegistry {
    builtin_registry().with(Flaky::failing(flaky_failures)).with(AlwaysFatal).with(Panics)
}

struct Harness {
    backend: Arc<LocalBackend<FakeClock>>,
    clock: FakeClock,
    worker: Worker<FakeClock>,
    control: mpsc::Sender<Control>,
    shutdown: CancellationToken,
}

fn harness(config: WorkerConfig, flaky_failures: u32) -> Harness {
    harness_with(config, registry(flaky_failures), |backend| backend as Arc<dyn ResultStore>)
}

/// Harness whose broker leases for `config.visibility_timeout` and whose
/// store is built from the backend by `store`.
fn harness_with(
    config: WorkerConfig,
    registry: HandlerRegistry,
    store: impl FnOnce(Arc<LocalBackend<FakeClock>>) -> Arc<dyn ResultStore>,
) -> Harness {
    let clock = FakeClock::new();
    let visibility = config.visibility_timeout.min(Duration::from_secs(30));
    let backend = Arc::new(LocalBackend::in_memory(visibility, clock.clone()));
    let deps = WorkerDeps { broker: backend.clone(), store: store(backend.clone()), registry };
    let (control, rx) = mpsc::channel(8);
    let shutdown = CancellationToken::new();
    let worker = Worker::new("worker-1", deps, config, clock.clone(), rx, shutdown.clone());
    Harness { backend, clock, worker, control, shutdown }
}

impl Harness {
    async fn publish(&self, id: &str, handler: &str, payload: serde_json::Value) {
        self.backend.publish(request(id, handler, payload)).await.unwrap();
    }

    /// Reserve the next message and run it through the worker.
    async fn deliver(&mut self) {
        let request = self.backend.reserve("worker-1").await.unwrap().unwrap();
        self.worker.process(request).await;
    }

    async fn record(&self, id: &str) -> JobRecord {
        self.backend.get(&JobId::from_string(id)).await.unwrap().unwrap()
    }
}

fn start_failures_harness() -> (Harness, Arc<StartFailures>) {
    let mut wrapper = None;
    let h = harness_with(WorkerConfig::default(), registry(2), |backend| {
        let store =
            Arc::new(StartFailures { inner: backend, start_failures: AtomicU32::new(0) });
        wrapper = Some(store.clone());
        store as Arc<dyn ResultStore>
    });
    (h, wrapper.unwrap())
}

async fn wait_for_status(backend: &LocalBackend<FakeClock>, id: &str, status: JobStatus) {
    let id = JobId::from_string(id);
    for _ in 0..500 {
        if backend.get(&id).await.unwrap().map(|r| r.status) == Some(status) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{} never reached {}", id, status);
}

fn ids(tasks: &[TaskInfo]) -> Vec<&str> {
    tasks.iter().map(|t| t.job_id.as_str()).collect()
}

#[tokio::test]
async fn success_is_recorded_and_acked() {
    let mut h = harness(WorkerConfig::default(), 0);
    h.publish("job-1", "first_n_primes", json!(5)).await;

    h.deliver().await;

    let record = h.record("job-1").await;
    assert_eq!(record.status, JobStatus::Success);
    assert_eq!(record.result, Some(json!([2, 3, 5, 7, 11])));
    assert_eq!(record.attempts, 1);
    assert_eq!(record.worker.as_deref(), Some("worker-1"));
    assert_eq!(h.backend.depth().await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_handler_fails_without_retry() {
    let mut h = harness(WorkerConfig::default(), 0);
    h.publish("job-1", "nope", json!(1)).await;

    h.deliver().await;

    let record = h.record("job-1").await;
    assert_eq!(record.status, JobStatus::Failure);
    assert_eq!(record.error.as_deref(), Some("unknown handler: nope"));
    assert_eq!(h.backend.depth().await.unwrap(), 0);
}

#[tokio::test]
async fn invalid_payload_reaching_worker_fails() {
    let mut h = harness(WorkerConfig::default(), 0);
    h.publish("job-1", "first_n_primes", json!(0)).await;

    h.deliver().await;

    let record = h.record("job-1").await;
    assert_eq!(record.status, JobStatus::Failure);
    assert_eq!(record.error.as_deref(), Some("invalid payload: n must be a positive integer"));
}

#[tokio::test]
async fn transient_error_defers_then_succeeds() {
    let mut h = harness(WorkerConfig::default(), 1);
    h.publish("job-1", "flaky", json!(21)).await;

    h.deliver().await;

    let record = h.record("job-1").await;
    assert_eq!(record.status, JobStatus::Retry);
    assert_eq!(record.error.as_deref(), Some("try later"));
    let scheduled = h.backend.scheduled().await.unwrap();
    assert_eq!(scheduled["worker-1"][0].eta_ms, Some(1_001_000));
    assert!(h.backend.reserve("worker-1").await.unwrap().is_none());

    h.clock.advance(Duration::from_secs(1));
    h.deliver().await;

    let record = h.record("job-1").await;
    assert_eq!(record.status, JobStatus::Success);
    assert_eq!(record.result, Some(json!(42)));
    assert_eq!(record.attempts, 2);
    assert!(record.error.is_none());
}

#[tokio::test]
async fn retry_after_lost_start_write_is_still_deferred() {
    let (mut h, store) = start_failures_harness();
    h.publish("job-1", "flaky", json!(4)).await;
    h.deliver().await;
    assert_eq!(h.record("job-1").await.status, JobStatus::Retry);

    h.clock.advance(Duration::from_secs(5));
    store.fail_starts(1);
    h.deliver().await;

    let record = h.record("job-1").await;
    assert_eq!(record.status, JobStatus::Retry);
    assert_eq!(record.attempts, 2);
    assert_eq!(h.backend.depth().await.unwrap(), 1);
    assert_eq!(ids(&h.backend.scheduled().await.unwrap()["worker-1"]), ["job-1"]);

    h.clock.advance(Duration::from_secs(5));
    h.deliver().await;

    let record = h.record("job-1").await;
    assert_eq!(record.status, JobStatus::Success);
    assert_eq!(record.attempts, 3);
    assert_eq!(h.backend.depth().await.unwrap(), 0);
}

#[tokio::test]
async fn unrecordable_retry_stays_queued_for_redelivery() {
    let (mut h, store) = start_failures_harness();
    h.publish("job-1", "flaky", json!(4)).await;
    h.deliver().await;

    h.clock.advance(Duration::from_secs(5));
    store.fail_starts(u32::MAX);
    h.deliver().await;

    assert_eq!(h.record("job-1").await.status, JobStatus::Retry);
    assert_eq!(h.backend.depth().await.unwrap(), 1);

    store.fail_starts(0);
    h.clock.advance(Duration::from_secs(31));
    h.deliver().await;

    let record = h.record("job-1").await;
    assert_eq!(record.status, JobStatus::Success);
    assert_eq!(h.backend.depth().await.unwrap(), 0);
}

#[tokio::test]
async fn transient_errors_exhaust_attempts() {
    let config = WorkerConfig {
        retry: RetryPolicy::default().max_attempts(2),
        ..WorkerConfig::default()
    };
    let mut h = harness(config, 10);
    h.publish("job-1", "flaky", json!(1)).await;

    h.deliver().await;
    h.clock.advance(Duration::from_secs(1));
    h.deliver().await;

    let record = h.record("job-1").await;
    assert_eq!(record.status, JobStatus::Failure);
    assert_eq!(record.error.as_deref(), Some("try later"));
    assert_eq!(record.attempts, 2);
    assert_eq!(h.backend.depth().await.unwrap(), 0);
}

#[tokio::test]
async fn fatal_error_is_not_retried() {
    let mut h = harness(WorkerConfig::default(), 0);
    h.publish("job-1", "fatal", json!(null)).await;

    h.deliver().await;

    let record = h.record("job-1").await;
    assert_eq!(record.status, JobStatus::Failure);
    assert_eq!(record.error.as_deref(), Some("cannot do that"));
    assert!(h.backend.scheduled().await.unwrap().is_empty());
    assert_eq!(h.backend.depth().await.unwrap(), 0);
}

#[tokio::test]
async fn panicking_handler_fails_the_job() {
    let mut h = harness(WorkerConfig::default(), 0);
    h.publish("job-1", "panics", json!(null)).await;

    h.deliver().await;

    let record = h.record("job-1").await;
    assert_eq!(record.status, JobStatus::Failure);
    assert_eq!(record.error.as_deref(), Some("handler panicked"));
}

#[tokio::test]
async fn revoked_job_is_acked_without_running() {
    let mut h = harness(WorkerConfig::default(), 0);
    h.publish("job-1", "first_n_primes", json!(5)).await;
    let id = JobId::from_string("job-1");
    h.backend.update(&id, StatusUpdate::Revoked { at_ms: 5 }).await.unwrap();

    h.deliver().await;

    let record = h.record("job-1").await;
    assert_eq!(record.status, JobStatus::Revoked);
    assert_eq!(record.attempts, 0);
    assert_eq!(h.backend.depth().await.unwrap(), 0);
}

#[tokio::test]
async fn redelivered_success_is_not_rerun() {
    let mut h = harness(WorkerConfig::default(), 0);
    h.publish("job-1", "first_n_primes", json!(3)).await;
    h.deliver().await;

    h.publish("job-1", "first_n_primes", json!(3)).await;
    h.deliver().await;

    let record = h.record("job-1").await;
    assert_eq!(record.status, JobStatus::Success);
    assert_eq!(record.attempts, 1);
    assert_eq!(h.backend.depth().await.unwrap(), 0);
}

#[tokio::test]
async fn failed_ack_keeps_result_and_message() {
    let clock = FakeClock::new();
    let store = Arc::new(LocalBackend::in_memory(Duration::from_secs(30), clock.clone()));
    let broker = FakeBroker::new();
    let deps = WorkerDeps {
        broker: Arc::new(broker.clone()),
        store: store.clone(),
        registry: builtin_registry(),
    };
    let (_tx, rx) = mpsc::channel(1);
    let mut worker =
        Worker::new("worker-1", deps, WorkerConfig::default(), clock, rx, CancellationToken::new());
    broker.publish(request("job-1", "first_n_primes", json!(2))).await.unwrap();
    let delivery = broker.reserve("worker-1").await.unwrap().unwrap();
    broker.set_offline(true);

    worker.process(delivery).await;

    let record = store.get(&JobId::from_string("job-1")).await.unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Success);
    assert!(broker.acked().is_empty());
}

#[tokio::test]
async fn idle_worker_answers_ping_and_inspect() {
    let h = harness(WorkerConfig::default(), 0);
    let Harness { control, shutdown, worker, .. } = h;
    let handle = tokio::spawn(worker.run());

    let (tx, rx) = oneshot::channel();
    control.send(Control::Ping(tx)).await.unwrap();
    assert_eq!(rx.await.unwrap(), PONG);

    let (tx, rx) = oneshot::channel();
    control.send(Control::Inspect(tx)).await.unwrap();
    assert_eq!(rx.await.unwrap(), WorkerLoad::default());

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn running_worker_drains_the_queue() {
    let config = WorkerConfig { poll_interval: Duration::from_millis(10), ..Default::default() };
    let h = harness(config, 0);
    for id in ["job-1", "job-2", "job-3"] {
        h.publish(id, "first_n_primes", json!(4)).await;
    }
    let Harness { backend, shutdown, worker, .. } = h;
    let handle = tokio::spawn(worker.run());

    for _ in 0..500 {
        if backend.depth().await.unwrap() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    for id in ["job-1", "job-2", "job-3"] {
        let record = backend.get(&JobId::from_string(id)).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Success);
    }
    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn busy_worker_answers_ping_and_reports_active_job() {
    let (gate, release) = Gate::new();
    let config = WorkerConfig { poll_interval: Duration::from_millis(10), ..Default::default() };
    let h = harness_with(config, registry(0).with(gate), |backend| backend as Arc<dyn ResultStore>);
    h.publish("job-1", "gate", json!(null)).await;
    h.publish("job-2", "first_n_primes", json!(2)).await;
    let Harness { backend, control, shutdown, worker, .. } = h;
    let handle = tokio::spawn(worker.run());
    wait_for_status(&backend, "job-1", JobStatus::Started).await;

    let (tx, rx) = oneshot::channel();
    control.send(Control::Ping(tx)).await.unwrap();
    assert_eq!(rx.await.unwrap(), PONG);

    let (tx, rx) = oneshot::channel();
    control.send(Control::Inspect(tx)).await.unwrap();
    let load = rx.await.unwrap();
    assert_eq!(ids(&load.active), ["job-1"]);
    assert_eq!(ids(&load.reserved), ["job-2"]);

    release.send(()).unwrap();
    wait_for_status(&backend, "job-2", JobStatus::Success).await;
    let first = backend.get(&JobId::from_string("job-1")).await.unwrap().unwrap();
    assert_eq!(first.status, JobStatus::Success);
    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn leases_are_renewed_while_handler_runs() {
    let (gate, release) = Gate::new();
    let config = WorkerConfig {
        poll_interval: Duration::from_millis(10),
        visibility_timeout: Duration::from_millis(100),
        ..Default::default()
    };
    let h = harness_with(config, registry(0).with(gate), |backend| backend as Arc<dyn ResultStore>);
    h.publish("job-1", "gate", json!(null)).await;
    let Harness { backend, clock, shutdown, worker, .. } = h;
    let handle = tokio::spawn(worker.run());
    wait_for_status(&backend, "job-1", JobStatus::Started).await;

    clock.advance(Duration::from_millis(60));
    tokio::time::sleep(Duration::from_millis(150)).await;
    clock.advance(Duration::from_millis(60));

    assert!(backend.reserve("worker-2").await.unwrap().is_none());

    release.send(()).unwrap();
    wait_for_status(&backend, "job-1", JobStatus::Success).await;
    shutdown.cancel();
    handle.await.unwrap();
}
