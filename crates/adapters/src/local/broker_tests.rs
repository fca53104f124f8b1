// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use errand_core::test_support::request;
use errand_core::FakeClock;
use serde_json::json;

const VISIBILITY: Duration = Duration::from_secs(30);

fn backend() -> (LocalBackend<FakeClock>, FakeClock) {
    let clock = FakeClock::new();
    (LocalBackend::in_memory(VISIBILITY, clock.clone()), clock)
}

async fn publish(backend: &LocalBackend<FakeClock>, ids: &[&str]) {
    for id in ids {
        backend.publish(request(id, "first_n_primes", json!(3))).await.unwrap();
    }
}

#[tokio::test]
async fn reserve_is_fifo_and_exclusive() {
    let (backend, _) = backend();
    publish(&backend, &["a", "b"]).await;

    let first = backend.reserve("worker-1").await.unwrap().unwrap();
    let second = backend.reserve("worker-2").await.unwrap().unwrap();

    assert_eq!(first.job_id, "a");
    assert_eq!(second.job_id, "b");
    assert!(backend.reserve("worker-3").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_publish_enqueues_once() {
    let (backend, _) = backend();
    publish(&backend, &["a", "a"]).await;
    assert_eq!(backend.depth().await.unwrap(), 1);
}

#[tokio::test]
async fn expired_lease_makes_message_visible_again() {
    let (backend, clock) = backend();
    publish(&backend, &["a"]).await;
    backend.reserve("worker-1").await.unwrap().unwrap();

    clock.advance(VISIBILITY + Duration::from_millis(1));

    let redelivered = backend.reserve("worker-2").await.unwrap().unwrap();
    assert_eq!(redelivered.job_id, "a");
    assert!(!backend.extend(&redelivered.job_id, "worker-1").await.unwrap());
}

#[tokio::test]
async fn extend_keeps_lease_alive() {
    let (backend, clock) = backend();
    publish(&backend, &["a"]).await;
    let job = backend.reserve("worker-1").await.unwrap().unwrap();

    clock.advance(VISIBILITY / 2);
    assert!(backend.extend(&job.job_id, "worker-1").await.unwrap());
    clock.advance(VISIBILITY / 2 + Duration::from_secs(1));

    assert!(backend.reserve("worker-2").await.unwrap().is_none());
}

#[tokio::test]
async fn ack_removes_message() {
    let (backend, clock) = backend();
    publish(&backend, &["a"]).await;
    let job = backend.reserve("worker-1").await.unwrap().unwrap();

    backend.ack(&job.job_id).await.unwrap();
    clock.advance(VISIBILITY * 2);

    assert_eq!(backend.depth().await.unwrap(), 0);
    assert!(backend.reserve("worker-1").await.unwrap().is_none());
    // Acking twice is harmless
    backend.ack(&job.job_id).await.unwrap();
}

#[tokio::test]
async fn deferred_message_waits_for_its_eta() {
    let (backend, clock) = backend();
    publish(&backend, &["a", "b"]).await;
    let job = backend.reserve("worker-1").await.unwrap().unwrap();

    let eta = clock.epoch_ms() + 2_000;
    backend.defer(&job.job_id, "worker-1", eta).await.unwrap();

    let scheduled = backend.scheduled().await.unwrap();
    assert_eq!(scheduled["worker-1"], vec![TaskInfo::new(job.job_id.clone(), "first_n_primes").with_eta(eta)]);

    assert_eq!(backend.reserve("worker-2").await.unwrap().unwrap().job_id, "b");
    assert!(backend.reserve("worker-2").await.unwrap().is_none());

    clock.advance(Duration::from_secs(2));
    assert_eq!(backend.reserve("worker-2").await.unwrap().unwrap().job_id, "a");
    assert!(backend.scheduled().await.unwrap().is_empty());
}

#[tokio::test]
async fn discard_drops_queued_message_only_once() {
    let (backend, _) = backend();
    publish(&backend, &["a"]).await;
    let id = JobId::from_string("a");

    assert!(backend.discard(&id).await.unwrap());
    assert!(!backend.discard(&id).await.unwrap());
    assert!(backend.reserve("worker-1").await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn publish_wakes_a_waiting_worker() {
    let (backend, _) = backend();
    let backend = std::sync::Arc::new(backend);

    let waiter = {
        let backend = std::sync::Arc::clone(&backend);
        tokio::spawn(async move {
            let started = tokio::time::Instant::now();
            backend.wait_for_message(Duration::from_secs(60)).await;
            started.elapsed()
        })
    };
    tokio::task::yield_now().await;
    publish(&backend, &["a"]).await;

    assert!(waiter.await.unwrap() < Duration::from_secs(60));
}
