// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use errand_adapters::{BackendStats, LocalBackend};
use errand_core::{SystemClock, UuidIdGen};
use fs2::FileExt;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::engine::{Dispatcher, FleetMonitor, Maintenance, Resolver, WorkerDeps, WorkerPool};
use crate::handlers::builtin_registry;
use crate::listener::{ListenCtx, Listener};

use super::{Config, Daemon, LifecycleError, StartupResult};

/// Start the daemon
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // A failed lock means the pid file belongs to the running daemon.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    // 1. Create state directory (needed for lock, WAL, etc.)
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents races
    // Use OpenOptions to avoid truncating the file before we hold the lock,
    // which would wipe the running daemon's PID.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file (truncate now that we hold the lock)
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file; // Drop mutability

    let address = errand_wire::endpoint_address(&config.url)?;

    // 3. Recover broker and result store from snapshot + WAL
    let backend = Arc::new(LocalBackend::open_system(
        &config.state_dir,
        config.worker.visibility_timeout,
    )?);
    let BackendStats { queued, records, .. } = backend.stats();
    info!(queued, records, "Recovered state");

    // 4. Handlers and workers
    let registry = builtin_registry();
    info!(handlers = ?registry.names().collect::<Vec<_>>(), "Registered handlers");
    let deps = WorkerDeps {
        broker: backend.clone(),
        store: backend.clone(),
        registry: registry.clone(),
    };
    let pool =
        Arc::new(WorkerPool::spawn(config.workers, deps, config.worker.clone(), SystemClock));

    // 5. Housekeeping
    let maintenance_stop = CancellationToken::new();
    let maintenance = Maintenance::new(backend.clone(), SystemClock, config.result_ttl)
        .spawn(config.maintenance_interval, maintenance_stop.clone());

    // 6. Bind (LAST - only after all validation passes)
    let tcp = match TcpListener::bind(&address).await {
        Ok(tcp) => tcp,
        Err(e) => {
            pool.drain(config.drain_timeout).await;
            maintenance_stop.cancel();
            return Err(LifecycleError::BindFailed(address, e));
        }
    };

    let shutdown = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx {
        dispatcher: Dispatcher::new(
            backend.clone(),
            backend.clone(),
            Arc::new(UuidIdGen),
            SystemClock,
        ),
        resolver: Resolver::new(backend.clone()),
        monitor: FleetMonitor::new(pool.clone(), config.ping_timeout),
        registry,
        broker: backend.clone(),
        store: backend.clone(),
        worker_count: pool.len(),
        start_time: Instant::now(),
        shutdown: Arc::clone(&shutdown),
        ipc_timeout: config.ipc_timeout,
    });
    let listener = Listener::new(tcp, ctx);

    info!(url = %config.url, workers = pool.len(), "Daemon started");

    Ok(StartupResult {
        daemon: Daemon {
            config: config.clone(),
            lock_file,
            backend,
            pool,
            maintenance,
            maintenance_stop,
            shutdown,
            start_time: Instant::now(),
        },
        listener,
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    // Only the PID file; WAL and snapshot hold user data.
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
