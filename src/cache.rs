use crate::item::Snapshot;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::debug;

/// Loaded snapshots keyed by their date.
///
/// Holds at most `capacity` snapshots: putting a new one evicts the oldest snapshot that is not
/// pinned. Pinned snapshots (the ones being compared) are never evicted, so the cache may grow
/// past its capacity while they are.
#[derive(Debug)]
pub struct SnapshotCache {
    capacity: usize,
    /// From the oldest to the newest insertion.
    entries: Vec<Snapshot>,
    pinned: HashSet<NaiveDate>,
}

impl SnapshotCache {
    pub const DEFAULT_CAPACITY: usize = 4;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
            pinned: HashSet::new(),
        }
    }

    /// Read a `YYYY-MM-DD` key.
    pub fn parse_key(key: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d").ok()
    }

    pub fn key(date: NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&Snapshot> {
        self.entries.iter().find(|snapshot| snapshot.date == date)
    }

    pub fn get_by_key(&self, key: &str) -> Option<&Snapshot> {
        self.get(Self::parse_key(key)?)
    }

    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.get(date).is_some()
    }

    /// Insert a snapshot, replacing the one of the same date, and return the evicted snapshots.
    pub fn put(&mut self, snapshot: Snapshot) -> Vec<Snapshot> {
        self.entries.retain(|entry| entry.date != snapshot.date);
        self.entries.push(snapshot);

        let mut evicted = vec![];
        while self.entries.len() > self.capacity {
            let Some(position) = self
                .entries
                .iter()
                .position(|entry| !self.pinned.contains(&entry.date))
            else {
                break;
            };
            let snapshot = self.entries.remove(position);
            debug!(date = %snapshot.date, "snapshot evicted");
            evicted.push(snapshot);
        }
        evicted
    }

    /// Remove a snapshot unless it is pinned.
    pub fn evict(&mut self, date: NaiveDate) -> Option<Snapshot> {
        if self.pinned.contains(&date) {
            return None;
        }
        let position = self.entries.iter().position(|entry| entry.date == date)?;
        Some(self.entries.remove(position))
    }

    pub fn pin(&mut self, date: NaiveDate) {
        self.pinned.insert(date);
    }

    pub fn unpin(&mut self, date: NaiveDate) {
        self.pinned.remove(&date);
    }

    #[inline]
    pub fn is_pinned(&self, date: NaiveDate) -> bool {
        self.pinned.contains(&date)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
