// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier and the request carried by the broker.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a submitted job.
    ///
    /// Returned to the caller at submission time and used to poll the
    /// result store. Unique for the lifetime of the job's record.
    pub struct JobId;
}

/// A unit of work as published to the broker.
///
/// Immutable once built: the broker owns it after publication and the
/// worker's acknowledgement removes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub job_id: JobId,
    /// Registered handler to invoke
    pub handler: String,
    /// Opaque handler input
    pub payload: serde_json::Value,
    pub submitted_at_ms: u64,
}

impl JobRequest {
    pub fn new(
        job_id: JobId,
        handler: impl Into<String>,
        payload: serde_json::Value,
        submitted_at_ms: u64,
    ) -> Self {
        Self { job_id, handler: handler.into(), payload, submitted_at_ms }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
