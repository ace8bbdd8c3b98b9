//! Persistence collaborator for the schedule store.
//!
//! Load-all/save-all semantics over one serialized snapshot; no partial
//! writes, no transactions. Acceptable because the data volume is small and
//! single-user.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::services::store::StoreSnapshot;

/// External storage for the whole schedule snapshot.
///
/// `load` returning `Ok(None)` means "nothing persisted yet"; the caller
/// starts from an empty store. Failures are non-fatal by contract.
pub trait StorePersistence {
    fn load(&self) -> Result<Option<StoreSnapshot>>;
    fn save(&mut self, snapshot: &StoreSnapshot) -> Result<()>;
}

/// JSON file-backed persistence under the per-user data directory.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorePersistence for JsonFileStore {
    fn load(&self) -> Result<Option<StoreSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read schedules from {}", self.path.display()))?;
        let snapshot = serde_json::from_str(&data).with_context(|| {
            format!(
                "failed to deserialize schedules from {}",
                self.path.display()
            )
        })?;
        Ok(Some(snapshot))
    }

    fn save(&mut self, snapshot: &StoreSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create dir {}", parent.display()))?;
        }

        let data = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, data)
            .with_context(|| format!("failed to write schedules to {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory persistence, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Option<StoreSnapshot>,
    pub fail_saves: bool,
    pub save_count: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            ..Self::default()
        }
    }
}

impl StorePersistence for MemoryStore {
    fn load(&self) -> Result<Option<StoreSnapshot>> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &StoreSnapshot) -> Result<()> {
        self.save_count += 1;
        if self.fail_saves {
            anyhow::bail!("simulated save failure");
        }
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::ScheduleEntry;
    use crate::services::store::ScheduleStore;
    use chrono::{NaiveDate, NaiveTime};
    use tempfile::tempdir;

    #[test]
    fn load_missing_file_returns_none() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("schedules.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_and_reload_snapshot() {
        let dir = tempdir().unwrap();
        let mut file_store = JsonFileStore::new(dir.path().join("nested/schedules.json"));

        let mut store = ScheduleStore::new();
        let entry = ScheduleEntry::new(
            store.mint_id(),
            "Persist across runs",
            NaiveDate::from_ymd_opt(2026, 8, 29).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        )
        .unwrap();
        store.upsert(entry.clone()).unwrap();

        file_store.save(&store.snapshot()).unwrap();

        let reloaded = file_store.load().unwrap().expect("snapshot present");
        let restored = ScheduleStore::from_snapshot(reloaded).unwrap();
        assert_eq!(restored.entries_for(entry.date), vec![entry]);
    }

    #[test]
    fn load_reports_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schedules.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.load().is_err());
    }

    #[test]
    fn memory_store_simulates_save_failure() {
        let mut store = MemoryStore::new();
        store.fail_saves = true;
        let result = store.save(&StoreSnapshot::default());
        assert!(result.is_err());
        assert_eq!(store.save_count, 1);
        assert!(store.load().unwrap().is_none());
    }
}
