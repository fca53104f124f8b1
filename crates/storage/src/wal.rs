// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log: one JSON object per line, each tagged with a sequence number.

use crate::snapshot::rotate_bak_path;
use errand_core::Event;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

/// Append-only event log.
///
/// Appends are buffered in memory until [`Wal::flush`], which writes and
/// syncs them. Callers that promise durability flush before returning.
pub struct Wal {
    path: PathBuf,
    file: File,
    write_seq: u64,
    buffer: Vec<u8>,
}

impl Wal {
    /// Open or create the log at `path`.
    ///
    /// A corrupt tail (invalid UTF-8 or JSON) is cut off: the original file
    /// is moved to a rotated `.bak` and the valid prefix is rewritten.
    pub fn open(path: &Path) -> Result<Self, WalError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let (entries, corrupt) = if path.exists() { scan(path)? } else { (Vec::new(), false) };

        if corrupt {
            let bak = rotate_bak_path(path);
            warn!(
                path = %path.display(),
                bak = %bak.display(),
                valid_entries = entries.len(),
                "corrupt WAL tail, keeping valid prefix",
            );
            fs::rename(path, &bak)?;
            write_entries(path, &entries)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let write_seq = entries.last().map(|e| e.seq).unwrap_or(0);
        Ok(Self { path: path.to_path_buf(), file, write_seq, buffer: Vec::new() })
    }

    /// Buffer `event` and return its sequence number.
    pub fn append(&mut self, event: &Event) -> Result<u64, WalError> {
        let seq = self.write_seq + 1;
        let entry = WalEntry { seq, event: event.clone() };
        serde_json::to_writer(&mut self.buffer, &entry)?;
        self.buffer.push(b'\n');
        self.write_seq = seq;
        Ok(seq)
    }

    /// Write buffered entries and sync them to disk.
    pub fn flush(&mut self) -> Result<(), WalError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.file.write_all(&self.buffer)?;
        self.file.sync_data()?;
        self.buffer.clear();
        Ok(())
    }

    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Sequence number of the last appended entry (0 when empty).
    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushed entries with `seq > after`, stopping at the first unreadable line.
    pub fn entries_after(&self, after: u64) -> Result<Vec<WalEntry>, WalError> {
        let (entries, _) = scan(&self.path)?;
        Ok(entries.into_iter().filter(|e| e.seq > after).collect())
    }

    /// Drop flushed entries with `seq < before`.
    pub fn truncate_before(&mut self, before: u64) -> Result<(), WalError> {
        self.flush()?;
        let (entries, _) = scan(&self.path)?;
        let keep: Vec<_> = entries.into_iter().filter(|e| e.seq >= before).collect();

        let tmp = self.path.with_extension("tmp");
        write_entries(&tmp, &keep)?;
        fs::rename(&tmp, &self.path)?;
        self.file = OpenOptions::new().append(true).open(&self.path)?;
        Ok(())
    }
}

/// Read entries up to the first corrupt line. Returns whether one was found.
fn scan(path: &Path) -> Result<(Vec<WalEntry>, bool), WalError> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for line in reader.split(b'\n') {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        match serde_json::from_slice::<WalEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(_) => return Ok((entries, true)),
        }
    }
    Ok((entries, false))
}

fn write_entries(path: &Path, entries: &[WalEntry]) -> Result<(), WalError> {
    let mut buf = Vec::new();
    for entry in entries {
        serde_json::to_writer(&mut buf, entry)?;
        buf.push(b'\n');
    }
    let mut file = File::create(path)?;
    file.write_all(&buf)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
