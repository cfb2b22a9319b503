//! Staffing demand matrix
//!
//! Each work center carries `demand[day_type][tier][slot] -> headcount`, stored
//! the way it arrives on the wire:
//!
//! ```json
//! {"weekday": {"1": [2, 1, 0]}, "weekend": {"1": [1, 0, 0]}}
//! ```
//!
//! Keys are kept as strings so that unexpected day types or tier keys survive
//! deserialization; lookups report *why* an entry is missing instead of failing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{CategoryId, DayType, WorkCenter, WorkCenterId, SHIFT_SLOTS};

/// Result of resolving one (day type, tier, slot) cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemandLookup {
    Found(u32),
    MissingDayType,
    MissingTier,
    MissingSlot,
}

impl DemandLookup {
    pub fn value(self) -> Option<u32> {
        match self {
            DemandLookup::Found(n) => Some(n),
            _ => None,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            DemandLookup::Found(_) => "present",
            DemandLookup::MissingDayType => "day type missing",
            DemandLookup::MissingTier => "tier missing",
            DemandLookup::MissingSlot => "slot missing",
        }
    }
}

/// Required headcount per day type, tier and shift slot
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DemandMatrix(BTreeMap<String, BTreeMap<String, Vec<u32>>>);

impl DemandMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the three slot headcounts for a day type and tier
    pub fn with(mut self, day_type: DayType, tier: CategoryId, slots: [u32; 3]) -> Self {
        self.0
            .entry(day_type.as_str().to_string())
            .or_default()
            .insert(tier.to_string(), slots.to_vec());
        self
    }

    /// Resolve a cell; `slot` is 1-based
    pub fn lookup(&self, day_type: DayType, tier: CategoryId, slot: u8) -> DemandLookup {
        let Some(tiers) = self.0.get(day_type.as_str()) else {
            return DemandLookup::MissingDayType;
        };
        let Some(slots) = tiers.get(&tier.to_string()) else {
            return DemandLookup::MissingTier;
        };
        match slot
            .checked_sub(1)
            .and_then(|idx| slots.get(usize::from(idx)))
        {
            Some(&n) => DemandLookup::Found(n),
            None => DemandLookup::MissingSlot,
        }
    }

    pub fn required(&self, day_type: DayType, tier: CategoryId, slot: u8) -> Option<u32> {
        self.lookup(day_type, tier, slot).value()
    }

    /// Tier keys present for a day type, as written in the input
    pub fn tier_keys(&self, day_type: DayType) -> Vec<&str> {
        self.0
            .get(day_type.as_str())
            .map(|tiers| tiers.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// A demand cell that generation will skip
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DemandGap {
    pub work_center: WorkCenterId,
    pub day_type: DayType,
    pub tier: CategoryId,
    pub slot: u8,
    pub lookup: DemandLookup,
}

impl std::fmt::Display for DemandGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "work center {} has no {} demand for tier {} slot {} ({})",
            self.work_center,
            self.day_type,
            self.tier,
            self.slot,
            self.lookup.reason()
        )
    }
}

pub(crate) fn gaps_for(center: &WorkCenter, tiers: &[CategoryId]) -> Vec<DemandGap> {
    let mut gaps = Vec::new();
    for day_type in [DayType::Weekday, DayType::Weekend] {
        for &tier in tiers {
            for slot in SHIFT_SLOTS {
                let lookup = center.demand.lookup(day_type, tier, slot);
                if lookup.value().is_none() {
                    gaps.push(DemandGap {
                        work_center: center.id,
                        day_type,
                        tier,
                        slot,
                        lookup,
                    });
                }
            }
        }
    }
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lookup_resolves_present_cell() {
        let matrix = DemandMatrix::new().with(DayType::Weekday, 1, [2, 1, 0]);
        assert_eq!(matrix.lookup(DayType::Weekday, 1, 1), DemandLookup::Found(2));
        assert_eq!(matrix.required(DayType::Weekday, 1, 3), Some(0));
    }

    #[test]
    fn lookup_explains_missing_cells() {
        let matrix = DemandMatrix::new().with(DayType::Weekday, 1, [2, 1, 0]);
        assert_eq!(matrix.lookup(DayType::Weekend, 1, 1), DemandLookup::MissingDayType);
        assert_eq!(matrix.lookup(DayType::Weekday, 2, 1), DemandLookup::MissingTier);
        assert_eq!(matrix.lookup(DayType::Weekday, 1, 4), DemandLookup::MissingSlot);
        assert_eq!(matrix.lookup(DayType::Weekday, 1, 0), DemandLookup::MissingSlot);
    }

    #[test]
    fn short_slot_list_is_a_gap_not_a_panic() {
        let json = r#"{"weekday": {"1": [3]}, "holiday": {"1": [9, 9, 9]}}"#;
        let matrix: DemandMatrix = serde_json::from_str(json).unwrap();
        assert_eq!(matrix.required(DayType::Weekday, 1, 1), Some(3));
        assert_eq!(matrix.lookup(DayType::Weekday, 1, 2), DemandLookup::MissingSlot);
    }

    #[test]
    fn round_trips_wire_shape() {
        let matrix = DemandMatrix::new()
            .with(DayType::Weekday, 1, [1, 0, 0])
            .with(DayType::Weekend, 1, [0, 0, 0]);
        let json = serde_json::to_string(&matrix).unwrap();
        assert_eq!(json, r#"{"weekday":{"1":[1,0,0]},"weekend":{"1":[0,0,0]}}"#);
    }

    #[test]
    fn gaps_cover_every_missing_combination() {
        let center = WorkCenter::new(5).demand(DemandMatrix::new().with(DayType::Weekday, 1, [1, 1, 1]));
        let gaps = gaps_for(&center, &[1, 2]);
        // weekend: 2 tiers x 3 slots, weekday: tier 2 x 3 slots
        assert_eq!(gaps.len(), 9);
        assert!(gaps.iter().all(|g| g.work_center == 5));
        assert_eq!(
            gaps.iter()
                .filter(|g| g.lookup == DemandLookup::MissingTier)
                .count(),
            3
        );
    }
}
