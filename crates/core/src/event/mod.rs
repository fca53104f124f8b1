// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable events for the local broker and result store.
//!
//! Every mutation of queue or record state is expressed as an [`Event`],
//! appended to the write-ahead log and then applied to the materialized
//! state. Replaying the log in order rebuilds the same state.

mod methods;

use crate::job::{JobId, JobRequest};
use crate::record::StatusUpdate;
use serde::{Deserialize, Serialize};

/// Serializes with `{"type": "scope:name", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Request accepted by the broker; the PENDING record is written with it.
    #[serde(rename = "job:published")]
    JobPublished { request: JobRequest, at_ms: u64 },

    /// Conditional status write that passed the transition check.
    #[serde(rename = "job:updated")]
    JobUpdated { job_id: JobId, update: StatusUpdate },

    /// Message handed back to the queue, not deliverable before `not_before_ms`.
    #[serde(rename = "job:deferred")]
    JobDeferred { job_id: JobId, worker: String, not_before_ms: u64 },

    /// Message removed from the queue (acknowledged or revoked).
    #[serde(rename = "job:acked")]
    JobAcked { job_id: JobId },

    /// Settled record dropped after its retention window.
    #[serde(rename = "record:purged")]
    RecordPurged { job_id: JobId },
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
