// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

mod startup;
pub use startup::startup;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use errand_adapters::LocalBackend;
use errand_core::RetryPolicy;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::engine::{WorkerConfig, WorkerPool, MAINTENANCE_INTERVAL};
use crate::env;
use crate::listener::Listener;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/errand)
    pub state_dir: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Listener address (`tcp://host:port`)
    pub url: String,
    pub workers: usize,
    pub worker: WorkerConfig,
    pub ping_timeout: Duration,
    /// Settled results older than this are purged
    pub result_ttl: Duration,
    pub ipc_timeout: Duration,
    pub drain_timeout: Duration,
    pub maintenance_interval: Duration,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Uses fixed paths under `~/.local/state/errand/` (or `$XDG_STATE_HOME/errand/`)
    /// unless `ERRAND_STATE_DIR` points elsewhere.
    pub fn load() -> Result<Self, LifecycleError> {
        let retry = RetryPolicy::default()
            .max_attempts(env::max_attempts())
            .initial_backoff(env::retry_backoff());
        Ok(Self {
            url: env::url(),
            workers: env::workers(),
            worker: WorkerConfig {
                prefetch: env::prefetch(),
                poll_interval: env::poll_interval(),
                visibility_timeout: env::visibility_timeout(),
                retry,
            },
            ping_timeout: env::ping_timeout(),
            result_ttl: env::result_ttl(),
            ipc_timeout: env::ipc_timeout(),
            drain_timeout: env::drain_timeout(),
            ..Self::for_dir(env::state_dir()?)
        })
    }

    /// Built-in defaults rooted at `state_dir`, ignoring the environment.
    pub fn for_dir(state_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        Self {
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            state_dir,
            url: env::DEFAULT_URL.to_string(),
            workers: 2,
            worker: WorkerConfig::default(),
            ping_timeout: Duration::from_secs(1),
            result_ttl: Duration::from_secs(86_400),
            ipc_timeout: Duration::from_secs(5),
            drain_timeout: Duration::from_secs(5),
            maintenance_interval: MAINTENANCE_INTERVAL,
        }
    }
}

/// A running daemon.
///
/// The listener is returned separately from startup to be spawned as a task.
pub struct Daemon {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    backend: Arc<LocalBackend>,
    pool: Arc<WorkerPool>,
    maintenance: JoinHandle<()>,
    maintenance_stop: CancellationToken,
    shutdown: Arc<Notify>,
    pub start_time: Instant,
}

/// Result of daemon startup: the daemon and its bound listener.
pub struct StartupResult {
    pub daemon: Daemon,
    pub listener: Listener,
}

impl Daemon {
    /// Notified when a client sends `Shutdown`.
    pub fn shutdown_requested(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Shutdown the daemon gracefully.
    ///
    /// Workers finish the job they are running (bounded by the drain
    /// timeout); messages they had reserved but not started stay in the
    /// broker and are redelivered on the next start.
    pub async fn shutdown(self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        if !self.pool.drain(self.config.drain_timeout).await {
            warn!("some jobs were still running at shutdown and will be redelivered");
        }

        self.maintenance_stop.cancel();
        if let Err(e) = self.maintenance.await {
            warn!("maintenance task ended abnormally: {}", e);
        }

        match self.backend.checkpoint() {
            Ok(Some(seq)) => info!(seq, "saved final shutdown snapshot"),
            Ok(None) => {}
            Err(e) => warn!("Failed to save shutdown snapshot: {}", e),
        }

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind {0}: {1}")]
    BindFailed(String, std::io::Error),

    #[error("Invalid listen address: {0}")]
    Endpoint(#[from] errand_wire::EndpointError),

    #[error("Storage recovery failed: {0}")]
    Recover(#[from] errand_storage::RecoverError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
