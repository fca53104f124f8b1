// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result store record for a single job.

use crate::job::JobId;
use crate::status::JobStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-job state held by the result store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub status: JobStatus,
    /// Handler output (SUCCESS only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error description (FAILURE, or the last transient error for RETRY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of times a worker started the job
    #[serde(default)]
    pub attempts: u32,
    /// Worker that last started the job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<String>,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
}

crate::builder! {
    pub struct JobRecordBuilder => JobRecord {
        into {
            job_id: JobId = "job-1",
        }
        set {
            status: JobStatus = JobStatus::Pending,
            attempts: u32 = 0,
            created_at_ms: u64 = 1_000_000,
        }
        option {
            result: serde_json::Value = None,
            error: String = None,
            worker: String = None,
            started_at_ms: u64 = None,
            finished_at_ms: u64 = None,
        }
    }
}

/// A requested status change, carrying the data that comes with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusUpdate {
    Started { worker: String, at_ms: u64 },
    Retry { error: String, at_ms: u64 },
    Success { result: serde_json::Value, at_ms: u64 },
    Failure { error: String, at_ms: u64 },
    Revoked { at_ms: u64 },
}

impl StatusUpdate {
    pub fn status(&self) -> JobStatus {
        match self {
            StatusUpdate::Started { .. } => JobStatus::Started,
            StatusUpdate::Retry { .. } => JobStatus::Retry,
            StatusUpdate::Success { .. } => JobStatus::Success,
            StatusUpdate::Failure { .. } => JobStatus::Failure,
            StatusUpdate::Revoked { .. } => JobStatus::Revoked,
        }
    }
}

/// A status change the state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("job {job_id}: cannot move from {from} to {to}")]
pub struct TransitionError {
    pub job_id: JobId,
    pub from: JobStatus,
    pub to: JobStatus,
}

impl JobRecord {
    /// Fresh record for a job the broker just accepted.
    pub fn pending(job_id: JobId, created_at_ms: u64) -> Self {
        Self {
            job_id,
            status: JobStatus::Pending,
            result: None,
            error: None,
            attempts: 0,
            worker: None,
            created_at_ms,
            started_at_ms: None,
            finished_at_ms: None,
        }
    }

    /// Apply `update` if the state machine allows it; the record is left
    /// untouched otherwise.
    pub fn apply(&mut self, update: &StatusUpdate) -> Result<(), TransitionError> {
        let next = update.status();
        if !self.status.can_transition_to(next) {
            let job_id = self.job_id.clone();
            return Err(TransitionError { job_id, from: self.status, to: next });
        }

        match update {
            StatusUpdate::Started { worker, at_ms } => {
                self.attempts += 1;
                self.worker = Some(worker.clone());
                self.started_at_ms = Some(*at_ms);
            }
            StatusUpdate::Retry { error, .. } => {
                self.error = Some(error.clone());
            }
            StatusUpdate::Success { result, at_ms } => {
                self.result = Some(result.clone());
                self.error = None;
                self.finished_at_ms = Some(*at_ms);
            }
            StatusUpdate::Failure { error, at_ms } => {
                self.error = Some(error.clone());
                self.finished_at_ms = Some(*at_ms);
            }
            StatusUpdate::Revoked { at_ms } => {
                self.finished_at_ms = Some(*at_ms);
            }
        }
        self.status = next;
        Ok(())
    }

    /// Time the record stopped changing, if it has.
    pub fn settled_at_ms(&self) -> Option<u64> {
        if self.status.is_final() {
            self.finished_at_ms
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
