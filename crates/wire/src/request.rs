// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use errand_core::JobId;
use serde::{Deserialize, Serialize};

/// Request from a client to the daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Validate and enqueue a job
    Submit {
        handler: String,
        payload: serde_json::Value,
    },

    /// Poll a job's status
    GetResult { job_id: JobId },

    /// Cancel a job that no worker has started
    Revoke { job_id: JobId },

    /// Fleet health and queue introspection
    WorkerStatus,

    /// Get daemon status
    Status,

    /// Request daemon shutdown
    Shutdown,
}

impl Request {
    /// Read-only requests are logged at debug level (clients poll them).
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Request::Ping
                | Request::Hello { .. }
                | Request::GetResult { .. }
                | Request::WorkerStatus
                | Request::Status
        )
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
