// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Externally visible job status and its transition rules.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Status of a job as stored in the result store and reported to callers.
///
/// ```text
/// PENDING ──► STARTED ──► SUCCESS
///    │           │ ▲  └─► FAILURE
///    │           ▼ │
///    │         RETRY
///    └──► REVOKED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Queued, or unknown to the result store
    Pending,
    /// A worker picked the job up
    Started,
    /// Handler returned a value
    Success,
    /// Handler failed for good
    Failure,
    /// Handler failed transiently; re-queued with a delay
    Retry,
    /// Cancelled before any worker started it
    Revoked,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Pending,
        JobStatus::Started,
        JobStatus::Success,
        JobStatus::Failure,
        JobStatus::Retry,
        JobStatus::Revoked,
    ];

    /// SUCCESS or FAILURE.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failure)
    }

    /// Terminal, or revoked: no worker may act on the job anymore.
    pub fn is_final(self) -> bool {
        self.is_terminal() || self == JobStatus::Revoked
    }

    /// Whether a record in `self` may be overwritten with `next`.
    ///
    /// STARTED → STARTED is allowed so a redelivered job can be restarted.
    /// PENDING → terminal is allowed because the STARTED write is best-effort.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        match self {
            Pending => matches!(next, Started | Success | Failure | Revoked),
            Started => matches!(next, Started | Retry | Success | Failure),
            Retry => matches!(next, Started | Success | Failure),
            Success | Failure | Revoked => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Started => "STARTED",
            JobStatus::Success => "SUCCESS",
            JobStatus::Failure => "FAILURE",
            JobStatus::Retry => "RETRY",
            JobStatus::Revoked => "REVOKED",
        }
    }
}

crate::simple_display! {
    JobStatus {
        Pending => "PENDING",
        Started => "STARTED",
        Success => "SUCCESS",
        Failure => "FAILURE",
        Retry => "RETRY",
        Revoked => "REVOKED",
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown job status: {}", s))
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
