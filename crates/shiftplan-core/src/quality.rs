//! Schedule quality metrics
//!
//! Scores a finished schedule from the employees' point of view:
//!
//! - **Preference score**: per assignment, `4 - rank` for the shift slot
//!   (rank 1 = first choice), `len + 1 - rank` for the work center, and a
//!   penalty of 5 when the shift falls on one of the employee's two
//!   most-preferred days off.
//! - **Fairness**: negative population standard deviation of the per-employee
//!   preference scores (0 is perfectly even).
//! - **Coverage**: staffed headcount against the largest tier demand of every
//!   (day, work center, slot) cell.
//! - **Workload**: assigned shifts against each employee's target workload.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Assignment, Employee, EmployeeId, Schedule, Workforce, SHIFT_SLOTS};

/// Off-day ranks at or below this count as preferred days off
pub const PREFERRED_OFF_DAY_RANK: u8 = 2;

/// Penalty for working on a preferred day off
pub const OFF_DAY_PENALTY: i64 = 5;

/// Headcount coverage over all demand cells
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    pub demanded: u64,
    pub staffed: u64,
    pub underfilled_cells: usize,
}

impl Coverage {
    /// Staffed share of demanded headcount, capped per cell
    pub fn ratio(&self) -> f64 {
        if self.demanded == 0 {
            1.0
        } else {
            self.staffed as f64 / self.demanded as f64
        }
    }
}

/// One employee's workload against their target
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkloadDeviation {
    pub employee_id: EmployeeId,
    pub assigned: usize,
    pub target: f64,
    pub deviation: f64,
}

/// Aggregate quality of a schedule
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleQuality {
    pub preference_score: i64,
    pub fairness: f64,
    pub coverage: Coverage,
    pub workload: Vec<WorkloadDeviation>,
}

impl ScheduleQuality {
    pub fn evaluate(schedule: &Schedule, workforce: &Workforce) -> Self {
        let mut per_employee: BTreeMap<EmployeeId, i64> = BTreeMap::new();
        for assignment in &schedule.assignments {
            let Some(employee) = workforce.employee(assignment.shift.employee_id) else {
                continue;
            };
            *per_employee.entry(employee.id).or_default() +=
                preference_score(employee, assignment, schedule);
        }

        let preference_score = per_employee.values().sum();
        let fairness = -std_dev(per_employee.values().map(|&s| s as f64));

        let workload = workforce
            .employees
            .iter()
            .map(|employee| {
                let assigned = schedule.assignments_for(employee.id).count();
                WorkloadDeviation {
                    employee_id: employee.id,
                    assigned,
                    target: employee.target_workload,
                    deviation: assigned as f64 - employee.target_workload,
                }
            })
            .collect();

        Self {
            preference_score,
            fairness,
            coverage: coverage(schedule, workforce),
            workload,
        }
    }
}

/// Preference score of a single assignment for its employee
pub fn preference_score(employee: &Employee, assignment: &Assignment, schedule: &Schedule) -> i64 {
    let mut score = 0;

    if let Some(pos) = employee
        .shift_preferences
        .iter()
        .position(|&s| s == assignment.slot)
    {
        score += 4 - (pos as i64 + 1);
    }

    let centers = &employee.work_center_preferences;
    if let Some(pos) = centers
        .iter()
        .position(|&w| w == assignment.shift.work_center_id)
    {
        score += centers.len() as i64 + 1 - (pos as i64 + 1);
    }

    let weekday = schedule.horizon().date(assignment.day).weekday();
    if employee
        .off_day_rank(weekday)
        .is_some_and(|rank| rank <= PREFERRED_OFF_DAY_RANK)
    {
        score -= OFF_DAY_PENALTY;
    }

    score
}

fn coverage(schedule: &Schedule, workforce: &Workforce) -> Coverage {
    let horizon = schedule.horizon();
    let tiers = workforce.tiers();
    let mut result = Coverage::default();

    for day in 0..horizon.days() {
        let day_type = horizon.day_type(day);
        for center in &workforce.work_centers {
            for slot in SHIFT_SLOTS {
                let demanded = tiers
                    .iter()
                    .filter_map(|&tier| center.demand.required(day_type, tier, slot))
                    .max()
                    .unwrap_or(0) as u64;
                let staffed = schedule.staffed(day, center.id, slot) as u64;
                result.demanded += demanded;
                result.staffed += staffed.min(demanded);
                if staffed < demanded {
                    result.underfilled_cells += 1;
                }
            }
        }
    }
    result
}

fn std_dev(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
