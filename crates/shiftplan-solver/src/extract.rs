//! Assignment extraction, demand ledger and cost accumulation

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use shiftplan_core::{
    Assignment, AssignmentSource, Employee, Horizon, Shift, WorkCenter, WorkCenterId,
    SHIFT_HOURS, SHIFT_SLOTS,
};

use crate::model::HesmModel;

/// Values above this count as a set binary
const SET_THRESHOLD: f64 = 0.5;

/// Headcount already placed per (day, work center, slot) by earlier tiers
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DemandLedger {
    counts: BTreeMap<(usize, WorkCenterId, u8), u32>,
}

impl DemandLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, assignments: &[Assignment]) {
        for a in assignments {
            *self
                .counts
                .entry((a.day, a.shift.work_center_id, a.slot))
                .or_default() += 1;
        }
    }

    pub fn existing(&self, day: usize, work_center: WorkCenterId, slot: u8) -> u32 {
        self.counts
            .get(&(day, work_center, slot))
            .copied()
            .unwrap_or(0)
    }
}

/// Turn every set `x[e,d,l,t]` into an assignment
pub fn extract_assignments(
    model: &HesmModel,
    values: &[f64],
    pool: &[&Employee],
    work_centers: &[WorkCenter],
    horizon: &Horizon,
) -> Vec<Assignment> {
    let layout = model.layout();
    let mut assignments = Vec::new();

    for (e, employee) in pool.iter().enumerate() {
        for d in 0..layout.days {
            for (l, center) in work_centers.iter().enumerate() {
                for (t, &slot) in SHIFT_SLOTS.iter().enumerate() {
                    let value = values
                        .get(layout.x(e, d, l, t).index())
                        .copied()
                        .unwrap_or(0.0);
                    if value > SET_THRESHOLD {
                        assignments.push(Assignment {
                            shift: Shift::for_slot(horizon, d, slot, employee.id, center.id),
                            tier: model.tier(),
                            day: d,
                            slot,
                            source: AssignmentSource::Optimal,
                        });
                    }
                }
            }
        }
    }
    assignments
}

/// Running labor cost of a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CostAccumulator {
    total: Decimal,
}

impl CostAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cost of `assignments` at `hourly_rate`
    pub fn shift_cost(assignments: &[Assignment], hourly_rate: Decimal) -> Decimal {
        hourly_rate * Decimal::from(SHIFT_HOURS) * Decimal::from(assignments.len())
    }

    /// Add the cost of one tier's assignments; returns that tier's cost
    pub fn add(&mut self, assignments: &[Assignment], hourly_rate: Decimal) -> Decimal {
        let cost = Self::shift_cost(assignments, hourly_rate);
        self.total += cost;
        cost
    }

    pub fn total(&self) -> Decimal {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VarLayout;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn horizon() -> Horizon {
        Horizon::new(
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn set_variables_become_assignments() {
        let employees = [Employee::new(5, 1), Employee::new(6, 1)];
        let pool: Vec<&Employee> = employees.iter().collect();
        let centers = [WorkCenter::new(7), WorkCenter::new(8)];
        let layout = VarLayout {
            employees: 2,
            days: 2,
            work_centers: 2,
            slots: 3,
        };
        let model = HesmModel::new(3, layout);
        let mut values = vec![0.0; layout.total()];
        values[layout.x(1, 1, 0, 2).index()] = 1.0;
        values[layout.x(0, 0, 1, 0).index()] = 0.9999;
        values[layout.x(0, 1, 1, 0).index()] = 0.2;

        let assignments = extract_assignments(&model, &values, &pool, &centers, &horizon());
        assert_eq!(assignments.len(), 2);

        let first = &assignments[0];
        assert_eq!(first.shift.employee_id, 5);
        assert_eq!(first.shift.work_center_id, 8);
        assert_eq!((first.day, first.slot, first.tier), (0, 1, 3));

        let second = &assignments[1];
        assert_eq!(second.shift.employee_id, 6);
        assert_eq!(second.shift.work_center_id, 7);
        assert_eq!(
            second.shift.start,
            NaiveDate::from_ymd_opt(2025, 1, 7)
                .unwrap()
                .and_hms_opt(22, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn ledger_counts_cells() {
        let h = horizon();
        let make = |employee, day, slot| Assignment {
            shift: Shift::for_slot(&h, day, slot, employee, 1),
            tier: 1,
            day,
            slot,
            source: AssignmentSource::Heuristic,
        };
        let mut ledger = DemandLedger::new();
        ledger.record(&[make(1, 0, 1), make(2, 0, 1), make(3, 1, 2)]);
        assert_eq!(ledger.existing(0, 1, 1), 2);
        assert_eq!(ledger.existing(1, 1, 2), 1);
        assert_eq!(ledger.existing(1, 1, 1), 0);
    }

    #[test]
    fn cost_is_rate_times_eight_hours_per_shift() {
        let h = horizon();
        let shifts: Vec<Assignment> = (0..5)
            .map(|i| Assignment {
                shift: Shift::for_slot(&h, 0, 1, i, 1),
                tier: 1,
                day: 0,
                slot: 1,
                source: AssignmentSource::Optimal,
            })
            .collect();

        let mut cost = CostAccumulator::new();
        assert_eq!(cost.add(&shifts, dec!(10.0)), dec!(400));
        assert_eq!(cost.add(&shifts[..1], dec!(12.5)), dec!(100));
        assert_eq!(cost.total(), dec!(500));
    }
}
