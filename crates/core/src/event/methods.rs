// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event methods: name, log summary, job id

use super::Event;
use crate::job::JobId;

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::JobPublished { .. } => "job:published",
            Event::JobUpdated { .. } => "job:updated",
            Event::JobDeferred { .. } => "job:deferred",
            Event::JobAcked { .. } => "job:acked",
            Event::RecordPurged { .. } => "record:purged",
        }
    }

    /// One-line description for debug logs.
    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            Event::JobPublished { request, .. } => {
                format!("{t} id={} handler={}", request.job_id, request.handler)
            }
            Event::JobUpdated { job_id, update } => {
                format!("{t} id={job_id} status={}", update.status())
            }
            Event::JobDeferred { job_id, worker, not_before_ms } => {
                format!("{t} id={job_id} worker={worker} not_before_ms={not_before_ms}")
            }
            Event::JobAcked { job_id } | Event::RecordPurged { job_id } => {
                format!("{t} id={job_id}")
            }
        }
    }

    pub fn job_id(&self) -> &JobId {
        match self {
            Event::JobPublished { request, .. } => &request.job_id,
            Event::JobUpdated { job_id, .. }
            | Event::JobDeferred { job_id, .. }
            | Event::JobAcked { job_id }
            | Event::RecordPurged { job_id } => job_id,
        }
    }
}
