// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable storage for the local broker and result store.
//!
//! State is event-sourced: mutations are appended to a JSON-lines WAL and
//! applied to [`MaterializedState`]. Periodic checkpoints write a
//! zstd-compressed snapshot and truncate the WAL behind it.

mod checkpoint;
mod snapshot;
mod state;
mod wal;

pub use checkpoint::{checkpoint, load_snapshot, recover, RecoverError};
pub use snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::{MaterializedState, QueuedMessage};
pub use wal::{Wal, WalEntry, WalError};
