// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status lookups for submitted jobs.

use std::sync::Arc;

use errand_adapters::{ResultStore, StoreError};
use errand_core::{JobId, JobStatus};

/// A job's status as reported to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct JobView {
    pub job_id: JobId,
    pub status: JobStatus,
    /// Present on SUCCESS
    pub result: Option<serde_json::Value>,
    /// Present on FAILURE, and on RETRY with the last transient error
    pub error: Option<String>,
}

pub struct Resolver {
    store: Arc<dyn ResultStore>,
}

impl Resolver {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self { store }
    }

    /// Current status of `job_id`. Ids without a record read as PENDING,
    /// so a queued job and an unknown one look the same.
    pub async fn get_status(&self, job_id: &JobId) -> Result<JobView, StoreError> {
        let Some(record) = self.store.get(job_id).await? else {
            return Ok(JobView {
                job_id: job_id.clone(),
                status: JobStatus::Pending,
                result: None,
                error: None,
            });
        };

        let result = match record.status {
            JobStatus::Success => record.result,
            _ => None,
        };
        let error = match record.status {
            JobStatus::Failure | JobStatus::Retry => record.error,
            _ => None,
        };
        Ok(JobView { job_id: record.job_id, status: record.status, result, error })
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
