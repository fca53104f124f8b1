// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Broker/result-store location when `ERRAND_URL` is unset
pub const DEFAULT_URL: &str = "tcp://127.0.0.1:6380";

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

fn millis(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(parse_env(name).unwrap_or(default_ms))
}

/// Resolve state directory: ERRAND_STATE_DIR > XDG_STATE_HOME/errand > ~/.local/state/errand
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("ERRAND_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("errand"));
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/errand"))
}

/// Listener address as a `tcp://host:port` URL
pub fn url() -> String {
    std::env::var("ERRAND_URL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_URL.to_string())
}

/// Worker pool size (default 2, at least 1)
pub fn workers() -> usize {
    parse_env::<usize>("ERRAND_WORKERS").unwrap_or(2).max(1)
}

/// Leased-but-not-started deliveries per worker (default 1)
pub fn prefetch() -> usize {
    parse_env("ERRAND_PREFETCH").unwrap_or(1)
}

pub fn visibility_timeout() -> Duration {
    millis("ERRAND_VISIBILITY_TIMEOUT_MS", 300_000)
}

/// Idle worker wait between broker polls
pub fn poll_interval() -> Duration {
    millis("ERRAND_POLL_INTERVAL_MS", 200)
}

/// Bound on fleet monitor pings (default 1s)
pub fn ping_timeout() -> Duration {
    millis("ERRAND_PING_TIMEOUT_MS", 1000)
}

/// Total executions per job, including the first (default 3, at least 1)
pub fn max_attempts() -> u32 {
    parse_env::<u32>("ERRAND_MAX_ATTEMPTS").unwrap_or(3).max(1)
}

pub fn retry_backoff() -> Duration {
    millis("ERRAND_RETRY_BACKOFF_MS", 1000)
}

/// How long settled results are kept (default one day)
pub fn result_ttl() -> Duration {
    Duration::from_secs(parse_env("ERRAND_RESULT_TTL_SECS").unwrap_or(86_400))
}

/// Default IPC timeout
pub fn ipc_timeout() -> Duration {
    millis("ERRAND_IPC_TIMEOUT_MS", 5000)
}

/// Shutdown drain timeout (default 5s)
pub fn drain_timeout() -> Duration {
    millis("ERRAND_DRAIN_TIMEOUT_MS", 5000)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
