//! Schedule audit against labor rules
//!
//! Recomputes, from the produced assignments alone, every per-employee rule the
//! optimal path enforces. The heuristic path makes no such promise, so an audit
//! of a heuristic-filled schedule may legitimately report violations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{EmployeeId, LaborRules, Schedule, WorkCenterId, Workforce};

/// Which rule an employee's shifts break
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ViolationKind {
    /// Assigned outside the employee's acceptable work centers
    UnpreferredWorkCenter { work_center: WorkCenterId },
    /// More than one shift on the same day
    MultipleShiftsPerDay { shifts: usize },
    /// Too many shifts in the 7-day window starting at `day`
    WeeklyCap { shifts: u32, cap: u32 },
    /// A run of worked days longer than allowed, ending at `day`
    ConsecutiveDays { run: u32, cap: u32 },
    /// Shifts on `day` and the following day
    BackToBack,
    /// Too few free weekend days over the horizon
    WeekendOffQuota { free: u32, required: u32 },
}

/// A single rule violation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleViolation {
    pub employee_id: EmployeeId,
    /// Day offset the violation is anchored at, if it has one
    pub day: Option<usize>,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl std::fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let at = self
            .day
            .map(|d| format!(" (day {})", d))
            .unwrap_or_default();
        match &self.kind {
            ViolationKind::UnpreferredWorkCenter { work_center } => write!(
                f,
                "employee {} assigned to unpreferred work center {}{}",
                self.employee_id, work_center, at
            ),
            ViolationKind::MultipleShiftsPerDay { shifts } => write!(
                f,
                "employee {} works {} shifts on one day{}",
                self.employee_id, shifts, at
            ),
            ViolationKind::WeeklyCap { shifts, cap } => write!(
                f,
                "employee {} works {} shifts in a week, cap {}{}",
                self.employee_id, shifts, cap, at
            ),
            ViolationKind::ConsecutiveDays { run, cap } => write!(
                f,
                "employee {} works {} consecutive days, cap {}{}",
                self.employee_id, run, cap, at
            ),
            ViolationKind::BackToBack => write!(
                f,
                "employee {} works back-to-back days{}",
                self.employee_id, at
            ),
            ViolationKind::WeekendOffQuota { free, required } => write!(
                f,
                "employee {} has {} free weekend days, needs {}",
                self.employee_id, free, required
            ),
        }
    }
}

/// Check every assigned employee against `rules`
pub fn audit(schedule: &Schedule, workforce: &Workforce, rules: &LaborRules) -> Vec<RuleViolation> {
    let horizon = schedule.horizon();
    let days = horizon.days();
    let weekend = horizon.weekend_days();

    let mut per_day: BTreeMap<EmployeeId, Vec<usize>> = BTreeMap::new();
    let mut violations = Vec::new();

    for assignment in &schedule.assignments {
        let employee_id = assignment.shift.employee_id;
        let counts = per_day
            .entry(employee_id)
            .or_insert_with(|| vec![0; days]);
        if let Some(slot) = counts.get_mut(assignment.day) {
            *slot += 1;
        }

        let accepted = workforce
            .employee(employee_id)
            .map(|e| e.accepts(assignment.shift.work_center_id))
            .unwrap_or(false);
        if !accepted {
            violations.push(RuleViolation {
                employee_id,
                day: Some(assignment.day),
                kind: ViolationKind::UnpreferredWorkCenter {
                    work_center: assignment.shift.work_center_id,
                },
            });
        }
    }

    for (&employee_id, counts) in &per_day {
        for (day, &shifts) in counts.iter().enumerate() {
            if shifts > 1 {
                violations.push(RuleViolation {
                    employee_id,
                    day: Some(day),
                    kind: ViolationKind::MultipleShiftsPerDay { shifts },
                });
            }
        }

        if days >= 7 {
            for start in 0..=(days - 7) {
                let shifts: usize = counts[start..start + 7].iter().sum();
                if shifts as u32 > rules.max_shifts_per_week {
                    violations.push(RuleViolation {
                        employee_id,
                        day: Some(start),
                        kind: ViolationKind::WeeklyCap {
                            shifts: shifts as u32,
                            cap: rules.max_shifts_per_week,
                        },
                    });
                }
            }
        }

        let mut run = 0u32;
        for (day, &shifts) in counts.iter().enumerate() {
            if shifts > 0 {
                run += 1;
                let run_ends = counts.get(day + 1).map_or(true, |&next| next == 0);
                if run_ends && run > rules.max_consecutive_days {
                    violations.push(RuleViolation {
                        employee_id,
                        day: Some(day),
                        kind: ViolationKind::ConsecutiveDays {
                            run,
                            cap: rules.max_consecutive_days,
                        },
                    });
                }
            } else {
                run = 0;
            }
        }

        if rules.forbid_back_to_back {
            for day in 0..days.saturating_sub(1) {
                if counts[day] > 0 && counts[day + 1] > 0 {
                    violations.push(RuleViolation {
                        employee_id,
                        day: Some(day),
                        kind: ViolationKind::BackToBack,
                    });
                }
            }
        }

        let free = weekend.iter().filter(|&&d| counts[d] == 0).count() as u32;
        if free < rules.weekend_days_off {
            violations.push(RuleViolation {
                employee_id,
                day: None,
                kind: ViolationKind::WeekendOffQuota {
                    free,
                    required: rules.weekend_days_off,
                },
            });
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Assignment, AssignmentSource, Employee, EmployeeCategory, Horizon, Shift};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn week() -> Horizon {
        Horizon::new(
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(),
        )
        .unwrap()
    }

    fn schedule_with(days: &[usize], work_center: WorkCenterId) -> Schedule {
        let horizon = week();
        Schedule {
            start_date: horizon.start,
            end_date: horizon.end,
            assignments: days
                .iter()
                .map(|&day| Assignment {
                    shift: Shift::for_slot(&horizon, day, 1, 1, work_center),
                    tier: 1,
                    day,
                    slot: 1,
                    source: AssignmentSource::Heuristic,
                })
                .collect(),
            total_cost: dec!(0),
            tiers: vec![],
            diagnostics: vec![],
        }
    }

    fn workforce() -> Workforce {
        Workforce {
            categories: vec![EmployeeCategory::new(1, dec!(10))],
            employees: vec![Employee::new(1, 1).work_centers([1])],
            work_centers: vec![],
        }
    }

    #[test]
    fn alternating_days_are_clean() {
        let violations = audit(&schedule_with(&[0, 2, 4], 1), &workforce(), &LaborRules::default());
        assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn consecutive_weekdays_break_back_to_back() {
        let violations = audit(
            &schedule_with(&[0, 1, 2, 3, 4], 1),
            &workforce(),
            &LaborRules::default(),
        );
        let back_to_back = violations
            .iter()
            .filter(|v| v.kind == ViolationKind::BackToBack)
            .count();
        assert_eq!(back_to_back, 4);
        assert!(!violations
            .iter()
            .any(|v| matches!(v.kind, ViolationKind::WeeklyCap { .. })));
    }

    #[test]
    fn full_week_breaks_caps_and_weekend_quota() {
        let violations = audit(
            &schedule_with(&[0, 1, 2, 3, 4, 5, 6], 1),
            &workforce(),
            &LaborRules::default(),
        );
        assert!(violations.iter().any(|v| v.kind
            == ViolationKind::WeeklyCap {
                shifts: 7,
                cap: 5
            }));
        assert!(violations.iter().any(|v| v.kind
            == ViolationKind::ConsecutiveDays {
                run: 7,
                cap: 5
            }));
        assert!(violations.iter().any(|v| v.kind
            == ViolationKind::WeekendOffQuota {
                free: 0,
                required: 2
            }));
    }

    #[test]
    fn unpreferred_work_center_is_reported() {
        let violations = audit(&schedule_with(&[0], 2), &workforce(), &LaborRules::default());
        assert_eq!(
            violations,
            vec![RuleViolation {
                employee_id: 1,
                day: Some(0),
                kind: ViolationKind::UnpreferredWorkCenter { work_center: 2 },
            }]
        );
    }

    #[test]
    fn back_to_back_can_be_allowed() {
        let rules = LaborRules {
            forbid_back_to_back: false,
            ..LaborRules::default()
        };
        let violations = audit(&schedule_with(&[0, 1], 1), &workforce(), &rules);
        assert!(violations.is_empty());
    }
}
