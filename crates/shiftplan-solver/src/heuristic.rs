//! Greedy fallback for tiers without an optimal model solution
//!
//! Walks day × work center × slot in input order and gives every open
//! position to the first employee of the pool who accepts that work center
//! and has not worked yet that day. Working-time rules (weekly cap,
//! consecutive days, weekend quota, back-to-back days) are not checked; a run
//! that falls back here can violate them.

use std::collections::BTreeSet;

use shiftplan_core::{
    Assignment, AssignmentSource, Diagnostic, DiagnosticCode, Shift, SHIFT_SLOTS,
};

use crate::builder::TierContext;
use crate::constraints::missing_demand;

/// Output of a greedy fill
#[derive(Debug, Default)]
pub struct HeuristicFill {
    pub assignments: Vec<Assignment>,
    pub diagnostics: Vec<Diagnostic>,
}

impl HeuristicFill {
    pub fn underfilled(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::W003UnderfilledCell)
            .count()
    }
}

/// Fill the tier's residual demand greedily
pub fn fill(ctx: &TierContext<'_>) -> HeuristicFill {
    let mut result = HeuristicFill::default();
    let mut reported = BTreeSet::new();

    for day in 0..ctx.horizon.days() {
        let day_type = ctx.horizon.day_type(day);
        // pool is replenished every day
        let mut busy = vec![false; ctx.pool.len()];

        for center in ctx.work_centers {
            for slot in SHIFT_SLOTS {
                let lookup = center.demand.lookup(day_type, ctx.tier, slot);
                let Some(required) = lookup.value() else {
                    if reported.insert((center.id, day_type, slot)) {
                        result
                            .diagnostics
                            .push(missing_demand(ctx.tier, center.id, day_type, slot, lookup));
                    }
                    continue;
                };

                let needed = required.saturating_sub(ctx.ledger.existing(day, center.id, slot));
                let mut placed = 0;
                while placed < needed {
                    let candidate = ctx
                        .pool
                        .iter()
                        .enumerate()
                        .find(|(idx, employee)| !busy[*idx] && employee.accepts(center.id));
                    let Some((idx, employee)) = candidate else {
                        break;
                    };
                    busy[idx] = true;
                    result.assignments.push(Assignment {
                        shift: Shift::for_slot(ctx.horizon, day, slot, employee.id, center.id),
                        tier: ctx.tier,
                        day,
                        slot,
                        source: AssignmentSource::Heuristic,
                    });
                    placed += 1;
                }

                if placed < needed {
                    tracing::warn!(
                        tier = ctx.tier,
                        day,
                        work_center = center.id,
                        slot,
                        missing = needed - placed,
                        "no pool employee left for cell"
                    );
                    result.diagnostics.push(Diagnostic::warning(
                        DiagnosticCode::W003UnderfilledCell,
                        ctx.tier,
                        format!(
                            "{} work center {} slot {}: staffed {} of {}",
                            ctx.horizon.date(day),
                            center.id,
                            slot,
                            placed,
                            needed
                        ),
                    ));
                }
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolvedTier;
    use crate::extract::DemandLedger;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use shiftplan_core::{DayType, DemandMatrix, Employee, Horizon, LaborRules, WorkCenter};

    fn week() -> Horizon {
        Horizon::new(
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(),
        )
        .unwrap()
    }

    fn weekday_only(slots: [u32; 3]) -> DemandMatrix {
        DemandMatrix::new()
            .with(DayType::Weekday, 1, slots)
            .with(DayType::Weekend, 1, [0, 0, 0])
    }

    fn run(
        employees: &[Employee],
        centers: &[WorkCenter],
        ledger: &DemandLedger,
    ) -> HeuristicFill {
        let pool: Vec<&Employee> = employees.iter().collect();
        let horizon = week();
        let settings = ResolvedTier {
            rules: LaborRules::default(),
            target_workload: 20.0,
        };
        let ctx = TierContext {
            tier: 1,
            pool: &pool,
            hourly_rate: dec!(10),
            horizon: &horizon,
            work_centers: centers,
            ledger,
            settings: &settings,
            unpreferred_penalty: 1000.0,
        };
        fill(&ctx)
    }

    #[test]
    fn single_employee_covers_every_weekday() {
        let employees = [Employee::new(1, 1).work_centers([1])];
        let centers = [WorkCenter::new(1).demand(weekday_only([1, 0, 0]))];
        let fill = run(&employees, &centers, &DemandLedger::new());

        assert_eq!(fill.assignments.len(), 5);
        assert_eq!(
            fill.assignments.iter().map(|a| a.day).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
        assert!(fill.assignments.iter().all(|a| a.slot == 1
            && a.source == AssignmentSource::Heuristic
            && a.shift.employee_id == 1));
        assert!(fill.diagnostics.is_empty());
    }

    #[test]
    fn one_shift_per_employee_per_day() {
        let employees = [Employee::new(1, 1).work_centers([1])];
        let centers = [WorkCenter::new(1).demand(weekday_only([1, 1, 0]))];
        let fill = run(&employees, &centers, &DemandLedger::new());

        // slot 2 goes unstaffed every weekday
        assert_eq!(fill.assignments.len(), 5);
        assert_eq!(fill.underfilled(), 5);
        assert!(fill.assignments.iter().all(|a| a.slot == 1));
    }

    #[test]
    fn employees_only_fill_accepted_centers() {
        let employees = [
            Employee::new(1, 1).work_centers([2]),
            Employee::new(2, 1).work_centers([1, 2]),
        ];
        let centers = [
            WorkCenter::new(1).demand(weekday_only([1, 0, 0])),
            WorkCenter::new(2).demand(weekday_only([1, 0, 0])),
        ];
        let fill = run(&employees, &centers, &DemandLedger::new());

        let monday: Vec<_> = fill
            .assignments
            .iter()
            .filter(|a| a.day == 0)
            .map(|a| (a.shift.work_center_id, a.shift.employee_id))
            .collect();
        assert_eq!(monday, vec![(1, 2), (2, 1)]);
        assert!(fill
            .assignments
            .iter()
            .all(|a| employees.iter().any(|e| e.id == a.shift.employee_id && e.accepts(a.shift.work_center_id))));
    }

    #[test]
    fn earlier_tiers_reduce_what_is_needed() {
        let employees = [Employee::new(1, 1).work_centers([1]), Employee::new(2, 1).work_centers([1])];
        let centers = [WorkCenter::new(1).demand(weekday_only([2, 0, 0]))];
        let mut ledger = DemandLedger::new();
        let horizon = week();
        ledger.record(&[Assignment {
            shift: Shift::for_slot(&horizon, 0, 1, 99, 1),
            tier: 0,
            day: 0,
            slot: 1,
            source: AssignmentSource::Optimal,
        }]);
        let fill = run(&employees, &centers, &ledger);

        assert_eq!(fill.assignments.iter().filter(|a| a.day == 0).count(), 1);
        assert_eq!(fill.assignments.iter().filter(|a| a.day == 1).count(), 2);
    }

    #[test]
    fn missing_demand_is_skipped_with_warning() {
        let employees = [Employee::new(1, 1).work_centers([1])];
        let centers = [WorkCenter::new(1).demand(DemandMatrix::new().with(DayType::Weekend, 1, [1, 0, 0]))];
        let fill = run(&employees, &centers, &DemandLedger::new());

        assert_eq!(fill.assignments.len(), 2);
        assert_eq!(fill.diagnostics.len(), 3);
        assert!(fill
            .diagnostics
            .iter()
            .all(|d| d.code == DiagnosticCode::W001MissingDemand));
    }
}
