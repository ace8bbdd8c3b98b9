//! Schedule store: date-keyed buckets of schedule entries.
//!
//! Entries live in per-day buckets; reads come back sorted by time so the
//! display is deterministic regardless of insertion order. Empty buckets are
//! pruned on delete. The store itself does no I/O; the controller snapshots
//! it through the persistence collaborator on every mutation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::models::entry::{EntryId, ScheduleEntry};
use crate::utils::date::{date_key, months_from, parse_date_key};

/// Bump when the snapshot layout changes, so older data is never silently
/// misread by a newer build.
pub const SCHEMA_VERSION: u32 = 1;

/// Serialized form of the whole store, keyed by canonical date string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub schema_version: u32,
    pub next_id: u64,
    pub buckets: BTreeMap<String, Vec<ScheduleEntry>>,
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            next_id: 1,
            buckets: BTreeMap::new(),
        }
    }
}

/// In-memory schedule store.
#[derive(Debug, Clone)]
pub struct ScheduleStore {
    buckets: BTreeMap<NaiveDate, Vec<ScheduleEntry>>,
    next_id: u64,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Rebuild the store from a persisted snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, ScheduleError> {
        if snapshot.schema_version > SCHEMA_VERSION {
            return Err(ScheduleError::Validation(format!(
                "snapshot schema version {} is newer than supported version {}",
                snapshot.schema_version, SCHEMA_VERSION
            )));
        }

        let mut buckets = BTreeMap::new();
        for (key, entries) in snapshot.buckets {
            let date = parse_date_key(&key).map_err(ScheduleError::Validation)?;
            if entries.is_empty() {
                log::warn!("dropping empty bucket for {} found in snapshot", key);
                continue;
            }
            buckets.insert(date, entries);
        }

        Ok(Self {
            buckets,
            next_id: snapshot.next_id.max(1),
        })
    }

    /// Snapshot the store for serialization.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            schema_version: SCHEMA_VERSION,
            next_id: self.next_id,
            buckets: self
                .buckets
                .iter()
                .map(|(date, entries)| (date_key(*date), entries.clone()))
                .collect(),
        }
    }

    /// Mint the next entry id. Zero-padded decimal, so ids sort in creation
    /// order.
    pub fn mint_id(&mut self) -> EntryId {
        let id = EntryId(format!("{:010}", self.next_id));
        self.next_id += 1;
        id
    }

    /// Insert or replace an entry.
    ///
    /// If an entry with the same id exists anywhere in the store it is
    /// removed from its old bucket first, which is what makes date-changing
    /// edits work. Rejects (before mutating) entries that fail validation.
    pub fn upsert(&mut self, entry: ScheduleEntry) -> Result<(), ScheduleError> {
        entry.validate().map_err(ScheduleError::Validation)?;

        self.evict(&entry.id);
        self.buckets.entry(entry.date).or_default().push(entry);
        Ok(())
    }

    /// Remove the entry from the named bucket, pruning the bucket if it
    /// becomes empty. Absent entries are a no-op, not an error.
    pub fn remove(&mut self, entry_id: &EntryId, date: NaiveDate) -> bool {
        let Some(entries) = self.buckets.get_mut(&date) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|e| &e.id != entry_id);
        let removed = entries.len() < before;

        if entries.is_empty() {
            self.buckets.remove(&date);
            log::debug!("pruned empty bucket for {}", date_key(date));
        }
        removed
    }

    /// Entries for the exact date, ascending by time (id breaks ties).
    pub fn entries_for(&self, date: NaiveDate) -> Vec<ScheduleEntry> {
        let mut entries = self.buckets.get(&date).cloned().unwrap_or_default();
        entries.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.id.cmp(&b.id)));
        entries
    }

    /// All entries dated within `month_count` consecutive months starting at
    /// (`start_year`, `start_month`), globally sorted by (date, time).
    pub fn entries_in_window(
        &self,
        start_year: i32,
        start_month: u32,
        month_count: u32,
    ) -> Vec<ScheduleEntry> {
        let mut entries: Vec<ScheduleEntry> = self
            .buckets
            .iter()
            .filter(|(date, _)| {
                let offset = months_from(start_year, start_month, **date);
                offset >= 0 && offset < month_count as i32
            })
            .flat_map(|(_, bucket)| bucket.iter().cloned())
            .collect();

        entries.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.time.cmp(&b.time))
                .then_with(|| a.id.cmp(&b.id))
        });
        entries
    }

    /// Find an entry by id within its date bucket.
    pub fn find(&self, entry_id: &EntryId, date: NaiveDate) -> Option<&ScheduleEntry> {
        self.buckets
            .get(&date)
            .and_then(|entries| entries.iter().find(|e| &e.id == entry_id))
    }

    pub fn has_entries(&self, date: NaiveDate) -> bool {
        self.buckets.contains_key(&date)
    }

    /// All entries in date order, for startup scans.
    pub fn iter_entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.buckets.values().flatten()
    }

    pub fn entry_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn evict(&mut self, entry_id: &EntryId) {
        let mut emptied = None;
        for (date, entries) in self.buckets.iter_mut() {
            let before = entries.len();
            entries.retain(|e| &e.id != entry_id);
            if entries.len() < before && entries.is_empty() {
                emptied = Some(*date);
            }
        }
        if let Some(date) = emptied {
            self.buckets.remove(&date);
        }
    }
}

impl Default for ScheduleStore {
    fn default() -> Self {
        Self::new()
    }
}
