// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;
use errand_core::{JobId, JobRecord, StatusUpdate};
use thiserror::Error;

/// Errors from result store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("result store unavailable: {0}")]
    Unavailable(String),
}

/// Result of a conditional status write.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Write accepted; the record as stored afterwards
    Applied(JobRecord),
    /// The state machine refused the write; the record as it stands
    Rejected(JobRecord),
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied(_))
    }

    pub fn record(&self) -> &JobRecord {
        match self {
            UpdateOutcome::Applied(r) | UpdateOutcome::Rejected(r) => r,
        }
    }
}

/// Key-value store of job records.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn get(&self, job_id: &JobId) -> Result<Option<JobRecord>, StoreError>;

    /// Compare-and-set: apply `update` only if the current status allows it.
    ///
    /// A job without a record is treated as PENDING.
    async fn update(&self, job_id: &JobId, update: StatusUpdate)
        -> Result<UpdateOutcome, StoreError>;

    /// Drop settled records older than `cutoff_ms`. Returns how many went.
    async fn purge_settled_before(&self, cutoff_ms: u64) -> Result<usize, StoreError>;

    async fn len(&self) -> Result<usize, StoreError>;
}
