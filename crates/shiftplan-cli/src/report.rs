//! Schedule rendering for `shiftplan generate`

use serde::Serialize;
use std::fmt::Write;

use shiftplan_core::audit::RuleViolation;
use shiftplan_core::quality::ScheduleQuality;
use shiftplan_core::{
    GeneratedSchedule, Schedule, ScheduleId, TierOutcome, TierStatus, Workforce,
};

/// Machine-readable output document
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<ScheduleId>,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    pub total_cost: rust_decimal::Decimal,
    pub records: Vec<GeneratedSchedule>,
    pub tiers: &'a [TierOutcome],
    pub violations: &'a [RuleViolation],
    pub quality: &'a ScheduleQuality,
    pub diagnostics: serde_json::Value,
}

impl<'a> JsonReport<'a> {
    pub fn new(
        schedule: &'a Schedule,
        schedule_id: Option<ScheduleId>,
        violations: &'a [RuleViolation],
        quality: &'a ScheduleQuality,
        diagnostics: serde_json::Value,
    ) -> Self {
        Self {
            schedule_id,
            start_date: schedule.start_date,
            end_date: schedule.end_date,
            total_cost: schedule.total_cost,
            // unsaved schedules carry id 0
            records: schedule.generated_records(schedule_id.unwrap_or(0)),
            tiers: &schedule.tiers,
            violations,
            quality,
            diagnostics,
        }
    }
}

fn status_str(status: TierStatus) -> &'static str {
    match status {
        TierStatus::Optimal => "optimal",
        TierStatus::Heuristic => "heuristic",
    }
}

/// Plain-text tables: tiers, assignments, audit, quality
pub fn render_text(
    schedule: &Schedule,
    workforce: &Workforce,
    schedule_id: Option<ScheduleId>,
    violations: &[RuleViolation],
    quality: &ScheduleQuality,
) -> String {
    let mut out = String::new();

    let _ = write!(
        out,
        "Schedule {} .. {}",
        schedule.start_date, schedule.end_date
    );
    if let Some(id) = schedule_id {
        let _ = write!(out, " (stored as #{})", id);
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} assignments, total cost {}",
        schedule.assignments.len(),
        schedule.total_cost
    );
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "{:<6} {:<10} {:>5} {:>12} {:>12}",
        "Tier", "Status", "Pool", "Assignments", "Cost"
    );
    for tier in &schedule.tiers {
        let _ = writeln!(
            out,
            "{:<6} {:<10} {:>5} {:>12} {:>12}",
            tier.tier,
            status_str(tier.status),
            tier.pool_size,
            tier.assignments,
            tier.cost
        );
    }
    let _ = writeln!(out);

    let mut assignments: Vec<_> = schedule.assignments.iter().collect();
    assignments.sort_by_key(|a| (a.shift.start, a.shift.work_center_id, a.shift.employee_id));

    let _ = writeln!(
        out,
        "{:<11} {:>4}  {:<5}  {:<5}  {:<16} {}",
        "Date", "Slot", "Start", "End", "Work center", "Employee"
    );
    for a in assignments {
        let center = workforce
            .work_center(a.shift.work_center_id)
            .map(|w| w.name.as_str())
            .unwrap_or("?");
        let employee = workforce
            .employee(a.shift.employee_id)
            .map(|e| e.name.as_str())
            .unwrap_or("?");
        let _ = writeln!(
            out,
            "{:<11} {:>4}  {:<5}  {:<5}  {:<16} {} ({})",
            a.shift.start.date(),
            a.slot,
            a.shift.start.format("%H:%M"),
            a.shift.end.format("%H:%M"),
            center,
            employee,
            a.shift.employee_id
        );
    }

    if !violations.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Rule violations ({}):", violations.len());
        for v in violations {
            let _ = writeln!(out, "  - {}", v);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Coverage: {}/{} ({:.1}%), {} under-filled cells",
        quality.coverage.staffed,
        quality.coverage.demanded,
        quality.coverage.ratio() * 100.0,
        quality.coverage.underfilled_cells
    );
    let _ = writeln!(
        out,
        "Preference score: {}, fairness: {:.2}",
        quality.preference_score, quality.fairness
    );
    out
}
