// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use errand_adapters::Broker;
use errand_core::test_support::request;
use errand_core::{FakeClock, JobId, StatusUpdate};
use serde_json::json;

const TTL: Duration = Duration::from_secs(3600);

async fn settle(backend: &LocalBackend<FakeClock>, id: &str, at_ms: u64) {
    let id = JobId::from_string(id);
    let started = StatusUpdate::Started { worker: "worker-1".into(), at_ms };
    backend.update(&id, started).await.unwrap();
    backend.update(&id, StatusUpdate::Success { result: json!([2]), at_ms }).await.unwrap();
}

#[tokio::test]
async fn tick_purges_only_expired_settled_records() {
    let clock = FakeClock::new();
    let backend = Arc::new(LocalBackend::in_memory(Duration::from_secs(30), clock.clone()));
    settle(&backend, "old", clock.epoch_ms()).await;
    backend.publish(request("queued", "first_n_primes", json!(1))).await.unwrap();
    clock.advance(TTL + Duration::from_secs(1));
    settle(&backend, "fresh", clock.epoch_ms()).await;

    let maintenance = Maintenance::new(backend.clone(), clock, TTL);
    assert_eq!(maintenance.tick().await.unwrap(), 1);

    assert!(backend.get(&JobId::from_string("old")).await.unwrap().is_none());
    assert!(backend.get(&JobId::from_string("fresh")).await.unwrap().is_some());
    assert!(backend.get(&JobId::from_string("queued")).await.unwrap().is_some());
}

#[tokio::test]
async fn tick_checkpoints_durable_backend() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let backend =
        Arc::new(LocalBackend::open(dir.path(), Duration::from_secs(30), clock.clone()).unwrap());
    backend.publish(request("job-1", "first_n_primes", json!(1))).await.unwrap();

    Maintenance::new(backend.clone(), clock, TTL).tick().await.unwrap();

    assert!(dir.path().join("snapshot.zst").exists());
}

#[tokio::test(start_paused = true)]
async fn spawned_task_stops_on_shutdown() {
    let clock = FakeClock::new();
    let backend = Arc::new(LocalBackend::in_memory(Duration::from_secs(30), clock.clone()));
    let shutdown = CancellationToken::new();
    let maintenance = Maintenance::new(backend, clock, TTL);
    let handle = maintenance.spawn(Duration::from_secs(5), shutdown.clone());

    tokio::time::sleep(Duration::from_secs(12)).await;
    shutdown.cancel();
    handle.await.unwrap();
}
