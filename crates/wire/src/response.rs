// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;

use errand_core::{JobId, JobStatus, QueueCounts, WorkerLoad};
use serde::{Deserialize, Serialize};

/// Class of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Payload or handler rejected at the boundary
    Validation,
    /// Broker could not accept the job; safe to retry
    BrokerUnavailable,
    /// Fleet introspection failed
    MonitorUnavailable,
    /// Malformed or out-of-place request
    BadRequest,
    Internal,
}

impl ErrorKind {
    /// HTTP-equivalent status code.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::Validation => 422,
            ErrorKind::BadRequest => 400,
            ErrorKind::BrokerUnavailable | ErrorKind::MonitorUnavailable => 503,
            ErrorKind::Internal => 500,
        }
    }
}

errand_core::simple_display! {
    ErrorKind {
        Validation => "validation",
        BrokerUnavailable => "broker unavailable",
        MonitorUnavailable => "monitor unavailable",
        BadRequest => "bad request",
        Internal => "internal",
    }
}

/// Response from the daemon to a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Health check response
    Pong,

    /// Version handshake response
    Hello { version: String },

    /// Job accepted and enqueued
    Submitted { job_id: JobId },

    /// Current view of a job
    JobResult {
        job_id: JobId,
        status: JobStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Outcome of a revoke request
    Revoked {
        job_id: JobId,
        /// False when a worker already started the job
        revoked: bool,
        status: JobStatus,
    },

    /// Fleet snapshot
    WorkerStatus {
        healthy: bool,
        workers: BTreeMap<String, String>,
        queue_status: QueueCounts,
        active_tasks: BTreeMap<String, WorkerLoad>,
    },

    /// Daemon status
    Status {
        uptime_secs: u64,
        workers: usize,
        /// Messages waiting in the broker, including deferred ones
        queued: usize,
        /// Records held by the result store
        records: usize,
    },

    /// Daemon is shutting down
    ShuttingDown,

    /// Error response
    Error { kind: ErrorKind, message: String },
}

impl Response {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Error { kind, message: message.into() }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
