//! Persistence boundary
//!
//! The engine never talks to storage while it optimizes. A finished
//! [`Schedule`] is handed to a [`ScheduleStore`] exactly once; a store either
//! keeps the schedule together with all of its generated records or keeps
//! nothing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::{GeneratedSchedule, Schedule, ScheduleId};

/// Storage failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Commit rejected: {0}")]
    Rejected(String),
}

/// Atomic sink for finished schedules
pub trait ScheduleStore {
    /// Persist the schedule and its generated records; returns the new id
    fn commit(&mut self, schedule: &Schedule) -> Result<ScheduleId, StoreError>;
}

/// A schedule as kept by a store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredSchedule {
    pub id: ScheduleId,
    pub schedule: Schedule,
    pub records: Vec<GeneratedSchedule>,
}

/// Store backed by a map, for tests and embedding
#[derive(Debug, Default)]
pub struct InMemoryStore {
    schedules: BTreeMap<ScheduleId, StoredSchedule>,
    next_id: ScheduleId,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ScheduleId) -> Option<&StoredSchedule> {
        self.schedules.get(&id)
    }

    /// Generated records of a schedule, empty if unknown
    pub fn records(&self, id: ScheduleId) -> &[GeneratedSchedule] {
        self.schedules
            .get(&id)
            .map(|s| s.records.as_slice())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }
}

impl ScheduleStore for InMemoryStore {
    fn commit(&mut self, schedule: &Schedule) -> Result<ScheduleId, StoreError> {
        let id = self.next_id + 1;
        let stored = StoredSchedule {
            id,
            schedule: schedule.clone(),
            records: schedule.generated_records(id),
        };
        self.schedules.insert(id, stored);
        self.next_id = id;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Assignment, AssignmentSource, Horizon, Shift};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn one_shift_schedule() -> Schedule {
        let day = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let horizon = Horizon::new(day, day).unwrap();
        Schedule {
            start_date: day,
            end_date: day,
            assignments: vec![Assignment {
                shift: Shift::for_slot(&horizon, 0, 1, 1, 1),
                tier: 1,
                day: 0,
                slot: 1,
                source: AssignmentSource::Heuristic,
            }],
            total_cost: dec!(80),
            tiers: vec![],
            diagnostics: vec![],
        }
    }

    #[test]
    fn commit_assigns_sequential_ids() {
        let mut store = InMemoryStore::new();
        let first = store.commit(&one_shift_schedule()).unwrap();
        let second = store.commit(&one_shift_schedule()).unwrap();
        assert_eq!((first, second), (1, 2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn records_carry_schedule_id() {
        let mut store = InMemoryStore::new();
        let id = store.commit(&one_shift_schedule()).unwrap();
        let records = store.records(id);
        assert_eq!(records.len(), 1);
        assert!(records.iter().all(|r| r.schedule_id == id));
        assert!(store.records(99).is_empty());
    }
}
