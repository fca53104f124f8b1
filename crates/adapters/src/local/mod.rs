// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable single-node broker and result store.
//!
//! Both roles share one [`MaterializedState`] guarded by a single mutex.
//! Every mutation is appended to the WAL and flushed before the state
//! changes and the call returns. Leases are runtime-only: after a restart
//! every unacknowledged message is deliverable again.

mod broker;
mod store;

use errand_core::{Clock, Event, JobId, SystemClock};
use errand_storage::{MaterializedState, RecoverError, Wal, WalError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::debug;

const WAL_FILE: &str = "events.wal";
const SNAPSHOT_FILE: &str = "snapshot.zst";

struct Lease {
    worker: String,
    expires_at: Instant,
}

struct Store {
    state: MaterializedState,
    wal: Option<Wal>,
    leases: HashMap<JobId, Lease>,
}

impl Store {
    /// Log `event` durably, then apply it.
    fn commit(&mut self, event: Event) -> Result<(), WalError> {
        if let Some(wal) = self.wal.as_mut() {
            wal.append(&event)?;
            wal.flush()?;
        }
        debug!(event = %event.log_summary(), "committed");
        self.state.apply_event(&event);
        Ok(())
    }

    /// Forget leases that ran past their visibility timeout.
    fn expire_leases(&mut self, now: Instant) {
        self.leases.retain(|job_id, lease| {
            let live = lease.expires_at > now;
            if !live {
                debug!(%job_id, worker = %lease.worker, "lease expired, message visible again");
            }
            live
        });
    }
}

/// Counts for daemon status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackendStats {
    pub queued: usize,
    pub leased: usize,
    pub records: usize,
}

/// Broker and result store backed by `errand-storage`.
pub struct LocalBackend<C: Clock = SystemClock> {
    store: Mutex<Store>,
    snapshot_path: Option<PathBuf>,
    visibility_timeout: Duration,
    clock: C,
    ready: Notify,
}

impl<C: Clock> LocalBackend<C> {
    /// Open (or create) the durable backend under `dir`, recovering state.
    pub fn open(dir: &Path, visibility_timeout: Duration, clock: C) -> Result<Self, RecoverError> {
        let wal = Wal::open(&dir.join(WAL_FILE))?;
        let snapshot_path = dir.join(SNAPSHOT_FILE);
        let state = errand_storage::recover(&snapshot_path, &wal)?;
        Ok(Self::build(state, Some(wal), Some(snapshot_path), visibility_timeout, clock))
    }

    /// Non-durable backend for tests and ephemeral runs.
    pub fn in_memory(visibility_timeout: Duration, clock: C) -> Self {
        Self::build(MaterializedState::default(), None, None, visibility_timeout, clock)
    }

    fn build(
        state: MaterializedState,
        wal: Option<Wal>,
        snapshot_path: Option<PathBuf>,
        visibility_timeout: Duration,
        clock: C,
    ) -> Self {
        Self {
            store: Mutex::new(Store { state, wal, leases: HashMap::new() }),
            snapshot_path,
            visibility_timeout,
            clock,
            ready: Notify::new(),
        }
    }

    /// Snapshot state and truncate the WAL. Returns the covered sequence
    /// number, or `None` for an in-memory backend.
    pub fn checkpoint(&self) -> Result<Option<u64>, RecoverError> {
        let mut store = self.store.lock();
        let Store { state, wal, .. } = &mut *store;
        match (wal.as_mut(), self.snapshot_path.as_deref()) {
            (Some(wal), Some(path)) => Ok(Some(errand_storage::checkpoint(state, wal, path)?)),
            _ => Ok(None),
        }
    }

    pub fn stats(&self) -> BackendStats {
        let store = self.store.lock();
        BackendStats {
            queued: store.state.queue.len(),
            leased: store.leases.len(),
            records: store.state.records.len(),
        }
    }

    pub fn visibility_timeout(&self) -> Duration {
        self.visibility_timeout
    }
}

impl LocalBackend<SystemClock> {
    pub fn open_system(dir: &Path, visibility_timeout: Duration) -> Result<Self, RecoverError> {
        Self::open(dir, visibility_timeout, SystemClock)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
