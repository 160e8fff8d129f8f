//! Timestamped metrics history with bounded retention
//!
//! Each session appends one entry per extracted frame. Retention is
//! time-bounded: entries older than the retention horizon (measured from the
//! newest entry) are evicted on append, which keeps long sessions at a
//! constant memory footprint.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default retention horizon in milliseconds (5 minutes).
///
/// Must cover the largest aggregation window a caller intends to use.
pub const DEFAULT_RETENTION_MS: i64 = 300_000;

/// One metrics record with the frame timestamp it was derived from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry<M> {
    /// Timestamp of the source observation (UTC)
    pub timestamp: DateTime<Utc>,
    /// The derived metrics record
    pub metrics: M,
}

impl<M> HistoryEntry<M> {
    pub fn new(timestamp: DateTime<Utc>, metrics: M) -> Self {
        Self { timestamp, metrics }
    }
}

/// Append-only metrics log with time-bounded retention.
///
/// Entries hold non-decreasing timestamps by construction: an append that
/// steps backwards in time is dropped and counted, never stored. Mutation is
/// confined to the session-processing path; share behind a lock if reads must
/// happen from another thread.
#[derive(Debug, Clone)]
pub struct HistoryBuffer<M> {
    entries: VecDeque<HistoryEntry<M>>,
    retention: Duration,
    dropped_out_of_order: u64,
    evicted: u64,
}

impl<M: Clone> HistoryBuffer<M> {
    /// Create a buffer with the default retention horizon
    pub fn new() -> Self {
        Self::with_retention(Duration::milliseconds(DEFAULT_RETENTION_MS))
    }

    /// Create a buffer that evicts entries older than `retention`
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            entries: VecDeque::new(),
            retention,
            dropped_out_of_order: 0,
            evicted: 0,
        }
    }

    /// Append an entry, evicting anything beyond the retention horizon.
    ///
    /// Returns `false` when the entry is older than the newest stored entry
    /// and was dropped to preserve ordering.
    pub fn append(&mut self, entry: HistoryEntry<M>) -> bool {
        if let Some(newest) = self.entries.back() {
            if entry.timestamp < newest.timestamp {
                self.dropped_out_of_order += 1;
                return false;
            }
        }

        let horizon = entry.timestamp - self.retention;
        self.entries.push_back(entry);

        while let Some(oldest) = self.entries.front() {
            if oldest.timestamp >= horizon {
                break;
            }
            self.entries.pop_front();
            self.evicted += 1;
        }

        true
    }

    /// Entries newer than `window` before the newest entry, in chronological
    /// order.
    ///
    /// Recency is anchored to the newest entry's timestamp rather than the
    /// wall clock, so replayed sessions aggregate identically.
    pub fn recent(&self, window: Duration) -> Vec<HistoryEntry<M>> {
        let newest = match self.entries.back() {
            Some(entry) => entry.timestamp,
            None => return Vec::new(),
        };
        let cutoff = newest - window;

        let mut selected: Vec<HistoryEntry<M>> = self
            .entries
            .iter()
            .rev()
            .take_while(|e| e.timestamp >= cutoff)
            .cloned()
            .collect();
        selected.reverse();
        selected
    }

    /// All retained entries in chronological order
    pub fn all(&self) -> Vec<HistoryEntry<M>> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Timestamp of the newest retained entry
    pub fn newest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.entries.back().map(|e| e.timestamp)
    }

    /// Entries dropped for stepping backwards in time
    pub fn dropped_out_of_order(&self) -> u64 {
        self.dropped_out_of_order
    }

    /// Entries evicted by the retention horizon
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Drop all entries and reset counters
    pub fn clear(&mut self) {
        self.entries.clear();
        self.dropped_out_of_order = 0;
        self.evicted = 0;
    }
}

impl<M: Clone> Default for HistoryBuffer<M> {
    fn default() -> Self {
        Self::new()
    }
}
