// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only, newline-delimited JSON write-ahead log.
//!
//! Every [`crate::event::Event`] is appended here before it is folded into
//! [`crate::state::MaterializedState`]; on restart the kernel replays
//! unprocessed entries (those with `seq > processed_seq`) to rebuild state
//! without having lost anything acknowledged as durable.

use crate::event::Event;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Number of buffered, unflushed appends after which [`Wal::needs_flush`]
/// reports true.
const FLUSH_THRESHOLD: usize = 100;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("wal io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("wal serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

pub struct Wal {
    path: PathBuf,
    file: File,
    entries: Vec<WalEntry>,
    processed_seq: u64,
    write_seq: u64,
    read_cursor: usize,
    pending: Vec<String>,
}

impl Wal {
    /// Open (creating if absent) the WAL at `path`. `processed_seq` is the
    /// cursor recorded alongside the last snapshot: entries at or below it
    /// are skipped by [`Wal::next_unprocessed`].
    ///
    /// If the file ends in a line that fails to parse, that line and
    /// everything after it is treated as a torn write: the original file is
    /// preserved at `<path>.bak` and the file on disk is rewritten with only
    /// the valid prefix.
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();

        let mut raw = String::new();
        if path.exists() {
            File::open(&path)?.read_to_string(&mut raw)?;
        }

        let mut entries = Vec::new();
        let mut corrupt = false;
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<WalEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(_) => {
                    corrupt = true;
                    break;
                }
            }
        }

        if corrupt {
            std::fs::write(path.with_extension("bak"), &raw)?;
            let mut rewritten = String::new();
            for entry in &entries {
                rewritten.push_str(&serde_json::to_string(entry)?);
                rewritten.push('\n');
            }
            std::fs::write(&path, rewritten)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let write_seq = entries.last().map(|e| e.seq).unwrap_or(0);
        let read_cursor = entries.iter().position(|e| e.seq > processed_seq).unwrap_or(entries.len());

        Ok(Self {
            path,
            file,
            entries,
            processed_seq,
            write_seq,
            read_cursor,
            pending: Vec::new(),
        })
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    pub fn append(&mut self, event: &Event) -> Result<u64, WalError> {
        let seq = self.write_seq + 1;
        let entry = WalEntry { seq, event: event.clone() };
        let line = serde_json::to_string(&entry)?;
        self.pending.push(line);
        self.entries.push(entry);
        self.write_seq = seq;
        Ok(seq)
    }

    pub fn flush(&mut self) -> Result<(), WalError> {
        for line in self.pending.drain(..) {
            writeln!(self.file, "{line}")?;
        }
        self.file.flush()?;
        Ok(())
    }

    pub fn needs_flush(&self) -> bool {
        self.pending.len() >= FLUSH_THRESHOLD
    }

    /// Return (and advance past) the next entry with `seq > processed_seq`
    /// that hasn't already been returned by this call in this process.
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry>, WalError> {
        if self.read_cursor >= self.entries.len() {
            return Ok(None);
        }
        let entry = self.entries[self.read_cursor].clone();
        self.read_cursor += 1;
        Ok(Some(entry))
    }

    pub fn mark_processed(&mut self, seq: u64) {
        if seq > self.processed_seq {
            self.processed_seq = seq;
        }
    }

    pub fn entries_after(&self, seq: u64) -> Result<Vec<WalEntry>, WalError> {
        Ok(self.entries.iter().filter(|e| e.seq > seq).cloned().collect())
    }

    /// Drop entries with `seq < keep_from` from the on-disk log. Used after
    /// a snapshot has made them redundant for replay.
    pub fn truncate_before(&mut self, keep_from: u64) -> Result<(), WalError> {
        self.flush()?;
        self.entries.retain(|e| e.seq >= keep_from);
        self.read_cursor = self.entries.iter().position(|e| e.seq > self.processed_seq).unwrap_or(self.entries.len());

        let mut rewritten = String::new();
        for entry in &self.entries {
            rewritten.push_str(&serde_json::to_string(entry)?);
            rewritten.push('\n');
        }
        std::fs::write(&self.path, rewritten)?;
        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        Ok(())
    }
}

/// Read every valid entry currently on disk without taking a write lease.
/// Used by read-only tooling; the daemon itself always goes through an open
/// [`Wal`].
pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<WalEntry>, WalError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let reader = BufReader::new(file);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
