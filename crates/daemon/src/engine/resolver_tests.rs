// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use errand_adapters::LocalBackend;
use errand_core::{FakeClock, StatusUpdate};
use serde_json::json;
use std::time::Duration;

fn setup() -> (Resolver, Arc<LocalBackend<FakeClock>>) {
    let backend = Arc::new(LocalBackend::in_memory(Duration::from_secs(30), FakeClock::new()));
    (Resolver::new(backend.clone()), backend)
}

fn started() -> StatusUpdate {
    StatusUpdate::Started { worker: "worker-1".into(), at_ms: 1 }
}

#[tokio::test]
async fn unknown_id_reads_as_pending() {
    let (resolver, _) = setup();
    let view = resolver.get_status(&JobId::from_string("missing")).await.unwrap();
    assert_eq!(view.status, JobStatus::Pending);
    assert!(view.result.is_none());
    assert!(view.error.is_none());
}

#[tokio::test]
async fn success_carries_result() {
    let (resolver, backend) = setup();
    let id = JobId::from_string("job-1");
    backend.update(&id, started()).await.unwrap();
    let success = StatusUpdate::Success { result: json!([2, 3, 5]), at_ms: 2 };
    backend.update(&id, success).await.unwrap();

    let view = resolver.get_status(&id).await.unwrap();
    assert_eq!(view.status, JobStatus::Success);
    assert_eq!(view.result, Some(json!([2, 3, 5])));
}

#[tokio::test]
async fn failure_carries_error() {
    let (resolver, backend) = setup();
    let id = JobId::from_string("job-1");
    backend.update(&id, started()).await.unwrap();
    backend.update(&id, StatusUpdate::Failure { error: "boom".into(), at_ms: 2 }).await.unwrap();

    let view = resolver.get_status(&id).await.unwrap();
    assert_eq!(view.status, JobStatus::Failure);
    assert_eq!(view.error.as_deref(), Some("boom"));
    assert!(view.result.is_none());
}

#[tokio::test]
async fn started_hides_stale_fields() {
    let (resolver, backend) = setup();
    let id = JobId::from_string("job-1");
    backend.update(&id, started()).await.unwrap();
    backend.update(&id, StatusUpdate::Retry { error: "flaky".into(), at_ms: 2 }).await.unwrap();
    backend.update(&id, started()).await.unwrap();

    let view = resolver.get_status(&id).await.unwrap();
    assert_eq!(view.status, JobStatus::Started);
    assert!(view.error.is_none());
}
