// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{Event, JobId, JobRequest, StatusUpdate};

pub use crate::id::SequentialIdGen;

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for the job state machine.
pub mod strategies {
    use crate::record::StatusUpdate;
    use crate::status::JobStatus;
    use proptest::prelude::*;

    pub fn arb_status() -> impl Strategy<Value = JobStatus> {
        proptest::sample::select(JobStatus::ALL.to_vec())
    }

    pub fn arb_update() -> impl Strategy<Value = StatusUpdate> {
        let at_ms = 0u64..10_000;
        prop_oneof![
            ("[a-z]{1,8}", at_ms.clone())
                .prop_map(|(worker, at_ms)| StatusUpdate::Started { worker, at_ms }),
            ("[a-z]{1,8}", at_ms.clone())
                .prop_map(|(error, at_ms)| StatusUpdate::Retry { error, at_ms }),
            (any::<u32>(), at_ms.clone()).prop_map(|(n, at_ms)| StatusUpdate::Success {
                result: serde_json::json!(n),
                at_ms
            }),
            ("[a-z]{1,8}", at_ms.clone())
                .prop_map(|(error, at_ms)| StatusUpdate::Failure { error, at_ms }),
            at_ms.prop_map(|at_ms| StatusUpdate::Revoked { at_ms }),
        ]
    }
}

// ── Factories ───────────────────────────────────────────────────────────

pub fn request(id: &str, handler: &str, payload: serde_json::Value) -> JobRequest {
    JobRequest::new(JobId::from_string(id), handler, payload, 1_000_000)
}

pub fn job_published_event(id: &str, handler: &str, payload: serde_json::Value) -> Event {
    Event::JobPublished { request: request(id, handler, payload), at_ms: 1_000_000 }
}

pub fn job_updated_event(id: &str, update: StatusUpdate) -> Event {
    Event::JobUpdated { job_id: JobId::from_string(id), update }
}

pub fn job_acked_event(id: &str) -> Event {
    Event::JobAcked { job_id: JobId::from_string(id) }
}

pub fn job_deferred_event(id: &str, worker: &str, not_before_ms: u64) -> Event {
    Event::JobDeferred { job_id: JobId::from_string(id), worker: worker.to_string(), not_before_ms }
}
