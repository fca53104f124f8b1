// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry policy applied by workers when a handler fails.

use crate::handler::HandlerError;
use std::time::Duration;

/// Exponential backoff with a cap. Only transient handler errors retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total executions allowed, including the first
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            multiplier: 2,
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// What to do with a failed execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    GiveUp,
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }

    crate::setters! {
        set {
            max_attempts: u32,
            initial_backoff: Duration,
            multiplier: u32,
            max_backoff: Duration,
        }
    }

    /// Delay before the execution following attempt number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }

    /// Decide after `attempts` executions have run and the last one failed with `error`.
    pub fn decide(&self, attempts: u32, error: &HandlerError) -> RetryDecision {
        if error.is_transient() && attempts < self.max_attempts {
            RetryDecision::Retry { delay: self.backoff_for(attempts) }
        } else {
            RetryDecision::GiveUp
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
