// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed request methods for DaemonClient.

use std::collections::BTreeMap;

use errand_core::{JobId, JobStatus, QueueCounts, WorkerLoad};
use errand_wire::{Request, Response, PROTOCOL_VERSION};
use serde::Serialize;

use crate::client::{ClientError, DaemonClient};

/// A job as reported by `GetResult`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    pub job_id: JobId,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevokeView {
    pub job_id: JobId,
    pub revoked: bool,
    pub status: JobStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetView {
    pub healthy: bool,
    pub workers: BTreeMap<String, String>,
    pub queue_status: QueueCounts,
    pub active_tasks: BTreeMap<String, WorkerLoad>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaemonStatus {
    pub uptime_secs: u64,
    pub workers: usize,
    pub queued: usize,
    pub records: usize,
}

impl DaemonClient {
    /// Enqueue a job; the daemon validates the payload first.
    pub async fn submit(
        &self,
        handler: &str,
        payload: serde_json::Value,
    ) -> Result<JobId, ClientError> {
        let request = Request::Submit { handler: handler.to_string(), payload };
        match self.send(&request).await? {
            Response::Submitted { job_id } => Ok(job_id),
            other => Self::reject(other),
        }
    }

    pub async fn get_result(&self, job_id: &JobId) -> Result<JobView, ClientError> {
        let request = Request::GetResult { job_id: job_id.clone() };
        match self.send(&request).await? {
            Response::JobResult { job_id, status, result, error } => {
                Ok(JobView { job_id, status, result, error })
            }
            other => Self::reject(other),
        }
    }

    pub async fn revoke(&self, job_id: &JobId) -> Result<RevokeView, ClientError> {
        let request = Request::Revoke { job_id: job_id.clone() };
        match self.send(&request).await? {
            Response::Revoked { job_id, revoked, status } => {
                Ok(RevokeView { job_id, revoked, status })
            }
            other => Self::reject(other),
        }
    }

    pub async fn worker_status(&self) -> Result<FleetView, ClientError> {
        match self.send(&Request::WorkerStatus).await? {
            Response::WorkerStatus { healthy, workers, queue_status, active_tasks } => {
                Ok(FleetView { healthy, workers, queue_status, active_tasks })
            }
            other => Self::reject(other),
        }
    }

    /// Get daemon status
    pub async fn status(&self) -> Result<DaemonStatus, ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status { uptime_secs, workers, queued, records } => {
                Ok(DaemonStatus { uptime_secs, workers, queued, records })
            }
            other => Self::reject(other),
        }
    }

    /// Get daemon version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello { version: PROTOCOL_VERSION.to_string() };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Self::reject(other),
        }
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.send(&Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Self::reject(other),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown).await? {
            Response::ShuttingDown => Ok(()),
            other => Self::reject(other),
        }
    }
}
