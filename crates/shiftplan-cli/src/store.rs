//! JSON file schedule store
//!
//! The whole store is one JSON document. A commit writes the updated
//! document to a uniquely named temporary file in the same directory and
//! renames it over the original, so readers see either the old store or the
//! new one.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use shiftplan_core::{Schedule, ScheduleId, ScheduleStore, StoreError, StoredSchedule};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    next_id: ScheduleId,
    schedules: Vec<StoredSchedule>,
}

/// Schedules kept in a single JSON file
#[derive(Debug, Clone)]
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

    /// All stored schedules; an absent file is an empty store
    pub fn load(&self) -> Result<Vec<StoredSchedule>, StoreError> {
        Ok(self.read_document()?.schedules)
    }

    fn read_document(&self) -> Result<StoreDocument, StoreError> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }
        let source = fs::read_to_string(&self.path)?;
        serde_json::from_str(&source).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Directory the temporary file must live in for the rename to be atomic
    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl ScheduleStore for JsonFileStore {
    fn commit(&mut self, schedule: &Schedule) -> Result<ScheduleId, StoreError> {
        let mut document = self.read_document()?;
        let id = document.next_id + 1;
        document.schedules.push(StoredSchedule {
            id,
            schedule: schedule.clone(),
            records: schedule.generated_records(id),
        });
        document.next_id = id;

        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        // dropped (and deleted) if anything below fails
        let mut temp = NamedTempFile::new_in(self.directory())?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use shiftplan_core::{Assignment, AssignmentSource, Horizon, Shift};

    fn schedule() -> Schedule {
        let day = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let horizon = Horizon::new(day, day).unwrap();
        Schedule {
            start_date: day,
            end_date: day,
            assignments: vec![Assignment {
                shift: Shift::for_slot(&horizon, 0, 2, 4, 1),
                tier: 1,
                day: 0,
                slot: 2,
                source: AssignmentSource::Optimal,
            }],
            total_cost: Decimal::new(800, 1),
            tiers: vec![],
            diagnostics: vec![],
        }
    }

    #[test]
    fn commits_append_with_increasing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("schedules.json"));

        assert_eq!(store.commit(&schedule()).unwrap(), 1);
        assert_eq!(store.commit(&schedule()).unwrap(), 2);

        let stored = store.load().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].id, 2);
        assert_eq!(stored[1].records[0].schedule_id, 2);
        assert_eq!(stored[0].schedule, schedule());
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn foreign_tmp_file_is_not_touched() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join("schedules.json.tmp");
        fs::write(&tmp, "another writer").unwrap();

        let mut store = JsonFileStore::new(dir.path().join("schedules.json"));
        assert_eq!(store.commit(&schedule()).unwrap(), 1);
        assert_eq!(fs::read_to_string(&tmp).unwrap(), "another writer");
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn parallel_commits_never_fail_or_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedules.json");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let path = path.clone();
                std::thread::spawn(move || JsonFileStore::new(path).commit(&schedule()))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }

        let stored = JsonFileStore::new(&path).load().unwrap();
        assert!(!stored.is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedules.json");
        fs::write(&path, "not json").unwrap();

        let mut store = JsonFileStore::new(&path);
        let err = store.commit(&schedule()).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "not json");
    }
}
