// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery (snapshot + WAL replay) and checkpointing.

use crate::snapshot::{rotate_bak_path, Snapshot, SnapshotError};
use crate::wal::{Wal, WalError};
use crate::MaterializedState;
use std::path::Path;
use tracing::{info, warn};

/// Load the snapshot at `path`, moving an unreadable one aside.
///
/// A corrupt snapshot is not fatal: the WAL still holds every event since
/// the last successful truncation, so recovery continues from empty state.
pub fn load_snapshot(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    match Snapshot::load(path) {
        Ok(snapshot) => Ok(snapshot),
        Err(e @ (SnapshotError::Json(_) | SnapshotError::Corrupt(_))) => {
            let bak = rotate_bak_path(path);
            warn!(error = %e, bak = %bak.display(), "unreadable snapshot, moving aside");
            std::fs::rename(path, &bak)?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Rebuild state from the snapshot and the WAL entries after it.
pub fn recover(
    snapshot_path: &Path,
    wal: &Wal,
) -> Result<MaterializedState, RecoverError> {
    let (mut state, seq) = match load_snapshot(snapshot_path)? {
        Some(snapshot) => (snapshot.state, snapshot.seq),
        None => (MaterializedState::default(), 0),
    };

    let entries = wal.entries_after(seq)?;
    let replayed = entries.len();
    for entry in &entries {
        state.apply_event(&entry.event);
    }

    info!(
        snapshot_seq = seq,
        replayed,
        records = state.records.len(),
        queued = state.queue.len(),
        "recovered state",
    );
    Ok(state)
}

/// Snapshot `state` as of the WAL's current sequence, then truncate the WAL.
///
/// Pending WAL appends are flushed first so the snapshot never covers
/// entries that are not on disk.
pub fn checkpoint(
    state: &MaterializedState,
    wal: &mut Wal,
    snapshot_path: &Path,
) -> Result<u64, RecoverError> {
    wal.flush()?;
    let seq = wal.write_seq();
    Snapshot::new(seq, state.clone()).save(snapshot_path)?;
    wal.truncate_before(seq + 1)?;
    Ok(seq)
}

#[derive(Debug, thiserror::Error)]
pub enum RecoverError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Wal(#[from] WalError),
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
