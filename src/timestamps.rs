// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Timestamp-indexed drawing snapshots.
//!
//! Entries are kept sorted by video time. Saving within the coalescing
//! window of an existing entry replaces that entry's snapshot instead of
//! creating a near-duplicate.

use crate::error::{Error, Result};
use crate::models::Snapshot;
use chrono::{DateTime, Utc};

/// A drawing snapshot tied to a video position.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampEntry {
    pub id: u64,
    pub time: f64,
    pub snapshot: Snapshot,
    pub created_at: DateTime<Utc>,
}

/// Ordered collection of timestamp entries.
#[derive(Debug, Clone)]
pub struct TimestampStore {
    entries: Vec<TimestampEntry>,
    next_id: u64,
    window_secs: f64,
}

impl Default for TimestampStore {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl TimestampStore {
    pub fn new(window_secs: f64) -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
            window_secs,
        }
    }

    /// Save `snapshot` at `time`, returning the id of the new or updated entry.
    pub fn save(&mut self, time: f64, snapshot: Snapshot) -> Result<u64> {
        self.save_at(time, snapshot, Utc::now())
    }

    /// [`save`](Self::save) with an explicit creation time.
    pub fn save_at(&mut self, time: f64, snapshot: Snapshot, now: DateTime<Utc>) -> Result<u64> {
        if !time.is_finite() || time < 0.0 {
            return Err(Error::Input(format!("invalid video time {time}")));
        }
        if let Some(idx) = self.coalesced_index(time) {
            let entry = &mut self.entries[idx];
            entry.snapshot = snapshot;
            entry.created_at = now;
            log::info!("Updated drawing at {:.2}s (entry {})", entry.time, entry.id);
            return Ok(entry.id);
        }

        let id = self.next_id;
        self.next_id += 1;
        let pos = self.entries.partition_point(|e| e.time <= time);
        self.entries.insert(
            pos,
            TimestampEntry {
                id,
                time,
                snapshot,
                created_at: now,
            },
        );
        log::info!("Saved drawing at {:.2}s (entry {}), total: {}", time, id, self.entries.len());
        Ok(id)
    }

    /// Remove an entry; returns whether it existed.
    pub fn delete(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let removed = self.entries.len() != before;
        if removed {
            log::info!("Deleted drawing entry {}", id);
        }
        removed
    }

    /// Entry within the coalescing window of `time`; the nearest one wins.
    pub fn find(&self, time: f64) -> Option<&TimestampEntry> {
        self.coalesced_index(time).map(|i| &self.entries[i])
    }

    /// The last entry at or before `time`.
    pub fn entry_active_at(&self, time: f64) -> Option<&TimestampEntry> {
        if !time.is_finite() {
            return None;
        }
        let after = self.entries.partition_point(|e| e.time <= time);
        after.checked_sub(1).map(|i| &self.entries[i])
    }

    pub fn get(&self, id: u64) -> Option<&TimestampEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// All entries, ascending by time.
    pub fn entries(&self) -> &[TimestampEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replace every entry (loading a session). Ids are kept as given.
    pub fn restore(&mut self, mut entries: Vec<TimestampEntry>) {
        entries.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.next_id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        self.entries = entries;
    }

    fn coalesced_index(&self, time: f64) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, (e.time - time).abs()))
            .filter(|(_, d)| *d < self.window_secs)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}
