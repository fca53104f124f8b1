// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::MaterializedState;
use errand_core::{JobId, JobRequest};
use serde::{Deserialize, Serialize};

/// A request waiting in the broker queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub request: JobRequest,
    /// Not deliverable before this time (set by retries)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before_ms: Option<u64>,
    /// Worker whose retry deferred the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_worker: Option<String>,
}

impl QueuedMessage {
    pub fn new(request: JobRequest) -> Self {
        Self { request, not_before_ms: None, origin_worker: None }
    }

    pub fn job_id(&self) -> &JobId {
        &self.request.job_id
    }

    pub fn is_ready(&self, now_ms: u64) -> bool {
        !matches!(self.not_before_ms, Some(at) if at > now_ms)
    }
}

impl MaterializedState {
    pub(super) fn position(&self, job_id: &JobId) -> Option<usize> {
        self.queue.iter().position(|m| m.job_id() == job_id)
    }

    pub fn queued(&self, job_id: &str) -> Option<&QueuedMessage> {
        self.queue.iter().find(|m| m.job_id() == job_id)
    }

    /// First message in delivery order that is due and not excluded by `skip`.
    pub fn next_ready(
        &self,
        now_ms: u64,
        skip: impl Fn(&JobId) -> bool,
    ) -> Option<&QueuedMessage> {
        self.queue.iter().find(|m| m.is_ready(now_ms) && !skip(m.job_id()))
    }

    /// Messages still waiting out a retry delay.
    pub fn deferred(&self, now_ms: u64) -> impl Iterator<Item = &QueuedMessage> {
        self.queue.iter().filter(move |m| !m.is_ready(now_ms))
    }
}
