//! Constraint families of the tier model
//!
//! Constants are always moved to the right-hand side so that every
//! left-hand side is a plain sum of variable terms.

use std::collections::BTreeSet;

use shiftplan_core::{
    CategoryId, DayType, DemandLookup, Diagnostic, DiagnosticCode, WorkCenterId, SHIFT_SLOTS,
};

use crate::builder::TierContext;
use crate::model::{ConstraintFamily, HesmModel, LinearExpr, Relation};

/// Window length of the weekly shift cap
const WEEK: usize = 7;

/// Add every family; returns data-quality findings
pub fn add_all(model: &mut HesmModel, ctx: &TierContext<'_>) -> Vec<Diagnostic> {
    let diagnostics = demand_coverage(model, ctx);
    one_shift_per_day(model);
    weekly_cap(model, ctx);
    consecutive_days(model, ctx);
    weekend_off(model, ctx);
    single_work_center(model);
    if ctx.settings.rules.forbid_back_to_back {
        back_to_back(model);
    }
    workload_deviation(model, ctx);
    symmetry_breaking(model, ctx);
    assignment_consistency(model);
    preference_exclusion(model, ctx);
    day_indicator(model);
    diagnostics
}

/// `Σ_e x[e,d,l,t] == demand − existing` for every cell with a demand entry
pub fn demand_coverage(model: &mut HesmModel, ctx: &TierContext<'_>) -> Vec<Diagnostic> {
    let layout = *model.layout();
    let mut diagnostics = Vec::new();
    let mut reported = BTreeSet::new();

    for d in 0..layout.days {
        let day_type = ctx.horizon.day_type(d);
        for (l, center) in ctx.work_centers.iter().enumerate() {
            for (t, &slot) in SHIFT_SLOTS.iter().enumerate() {
                let lookup = center.demand.lookup(day_type, ctx.tier, slot);
                let Some(required) = lookup.value() else {
                    if reported.insert((center.id, day_type, slot)) {
                        diagnostics.push(missing_demand(ctx.tier, center.id, day_type, slot, lookup));
                    }
                    continue;
                };

                let existing = ctx.ledger.existing(d, center.id, slot);
                let residual = f64::from(required) - f64::from(existing);
                if residual < 0.0 {
                    diagnostics.push(Diagnostic::warning(
                        DiagnosticCode::W004NegativeResidualDemand,
                        ctx.tier,
                        format!(
                            "day {} work center {} slot {}: {} already placed against demand {}",
                            d, center.id, slot, existing, required
                        ),
                    ));
                }

                let lhs = LinearExpr::sum((0..layout.employees).map(|e| layout.x(e, d, l, t)));
                model.add_constraint(ConstraintFamily::DemandCoverage, lhs, Relation::Eq, residual);
            }
        }
    }
    diagnostics
}

/// Warning for a skipped demand cell
pub(crate) fn missing_demand(
    tier: CategoryId,
    work_center: WorkCenterId,
    day_type: DayType,
    slot: u8,
    lookup: DemandLookup,
) -> Diagnostic {
    tracing::warn!(
        tier,
        work_center,
        %day_type,
        slot,
        reason = lookup.reason(),
        "demand entry missing, skipping cell"
    );
    Diagnostic::warning(
        DiagnosticCode::W001MissingDemand,
        tier,
        format!(
            "work center {} has no {} demand for tier {} slot {} ({})",
            work_center,
            day_type,
            tier,
            slot,
            lookup.reason()
        ),
    )
}

/// `Σ_{l,t} x[e,d,l,t] − Σ_l w[e,l] ≤ 0`
pub fn one_shift_per_day(model: &mut HesmModel) {
    let layout = *model.layout();
    for e in 0..layout.employees {
        for d in 0..layout.days {
            let mut lhs = LinearExpr::sum(layout.x_day(e, d));
            for w in layout.w_all(e) {
                lhs.add_term(w, -1.0);
            }
            model.add_constraint(ConstraintFamily::OneShiftPerDay, lhs, Relation::Le, 0.0);
        }
    }
}

/// Every 7-day window inside the horizon: `Σ x − cap·Σ_l w ≤ 0`
pub fn weekly_cap(model: &mut HesmModel, ctx: &TierContext<'_>) {
    let layout = *model.layout();
    if layout.days < WEEK {
        return;
    }
    let cap = f64::from(ctx.settings.rules.max_shifts_per_week);
    for e in 0..layout.employees {
        for start in 0..=layout.days - WEEK {
            let mut lhs = LinearExpr::sum(layout.x_days(e, start..start + WEEK));
            for w in layout.w_all(e) {
                lhs.add_term(w, -cap);
            }
            model.add_constraint(ConstraintFamily::WeeklyCap, lhs, Relation::Le, 0.0);
        }
    }
}

/// Every run of `max + 1` days holds at most `max` shifts
pub fn consecutive_days(model: &mut HesmModel, ctx: &TierContext<'_>) {
    let layout = *model.layout();
    let max = ctx.settings.rules.max_consecutive_days as usize;
    let window = max + 1;
    if layout.days < window {
        return;
    }
    for e in 0..layout.employees {
        for start in 0..=layout.days - window {
            let lhs = LinearExpr::sum(layout.x_days(e, start..start + window));
            model.add_constraint(
                ConstraintFamily::ConsecutiveDays,
                lhs,
                Relation::Le,
                max as f64,
            );
        }
    }
}

/// `Σ_{d weekend} (1 − Σ x[e,d]) ≥ n`, i.e. `Σ_{d weekend} Σ x[e,d] ≤ |W| − n`
pub fn weekend_off(model: &mut HesmModel, ctx: &TierContext<'_>) {
    let layout = *model.layout();
    let weekend = ctx.horizon.weekend_days();
    let rhs = weekend.len() as f64 - f64::from(ctx.settings.rules.weekend_days_off);
    for e in 0..layout.employees {
        let lhs = LinearExpr::sum(weekend.iter().flat_map(|&d| layout.x_day(e, d)));
        model.add_constraint(ConstraintFamily::WeekendOff, lhs, Relation::Le, rhs);
    }
}

/// `Σ_l w[e,l] ≤ 1`
pub fn single_work_center(model: &mut HesmModel) {
    let layout = *model.layout();
    for e in 0..layout.employees {
        let lhs = LinearExpr::sum(layout.w_all(e));
        model.add_constraint(ConstraintFamily::SingleWorkCenter, lhs, Relation::Le, 1.0);
    }
}

/// `Σ x[e,d] + Σ x[e,d+1] ≤ 1`
pub fn back_to_back(model: &mut HesmModel) {
    let layout = *model.layout();
    for e in 0..layout.employees {
        for d in 0..layout.days.saturating_sub(1) {
            let lhs = LinearExpr::sum(layout.x_days(e, d..d + 2));
            model.add_constraint(ConstraintFamily::BackToBack, lhs, Relation::Le, 1.0);
        }
    }
}

/// `v[e] ≥ |total(e) − Δ|` as two linear rows
pub fn workload_deviation(model: &mut HesmModel, ctx: &TierContext<'_>) {
    let layout = *model.layout();
    let target = ctx.settings.target_workload;
    for e in 0..layout.employees {
        let total = LinearExpr::sum(layout.x_days(e, 0..layout.days));

        // v − total ≥ −Δ
        let mut above = LinearExpr::new();
        above.add_term(layout.v(e), 1.0);
        above.add_scaled(&total, -1.0);
        model.add_constraint(ConstraintFamily::WorkloadDeviation, above, Relation::Ge, -target);

        // v + total ≥ Δ
        let mut below = total;
        below.add_term(layout.v(e), 1.0);
        model.add_constraint(ConstraintFamily::WorkloadDeviation, below, Relation::Ge, target);
    }
}

/// `total(e1) − total(e2) ≥ 0` for e1 before e2 with identical preference lists
pub fn symmetry_breaking(model: &mut HesmModel, ctx: &TierContext<'_>) {
    let layout = *model.layout();
    for (i, first) in ctx.pool.iter().enumerate() {
        for (j, second) in ctx.pool.iter().enumerate().skip(i + 1) {
            if first.shift_preferences != second.shift_preferences
                || first.work_center_preferences != second.work_center_preferences
            {
                continue;
            }
            let mut lhs = LinearExpr::sum(layout.x_days(i, 0..layout.days));
            lhs.add_scaled(&LinearExpr::sum(layout.x_days(j, 0..layout.days)), -1.0);
            model.add_constraint(ConstraintFamily::SymmetryBreaking, lhs, Relation::Ge, 0.0);
        }
    }
}

/// `x[e,d,l,t] − w[e,l] ≤ 0`
pub fn assignment_consistency(model: &mut HesmModel) {
    let layout = *model.layout();
    for e in 0..layout.employees {
        for d in 0..layout.days {
            for l in 0..layout.work_centers {
                for t in 0..layout.slots {
                    let mut lhs = LinearExpr::new();
                    lhs.add_term(layout.x(e, d, l, t), 1.0);
                    lhs.add_term(layout.w(e, l), -1.0);
                    model.add_constraint(
                        ConstraintFamily::AssignmentConsistency,
                        lhs,
                        Relation::Le,
                        0.0,
                    );
                }
            }
        }
    }
}

/// `w[e,l] = 0` outside the employee's preferences
pub fn preference_exclusion(model: &mut HesmModel, ctx: &TierContext<'_>) {
    let layout = *model.layout();
    for (e, employee) in ctx.pool.iter().enumerate() {
        for (l, center) in ctx.work_centers.iter().enumerate() {
            if !employee.accepts(center.id) {
                let lhs = LinearExpr::sum([layout.w(e, l)]);
                model.add_constraint(ConstraintFamily::PreferenceExclusion, lhs, Relation::Eq, 0.0);
            }
        }
    }
}

/// `z[e,d] − Σ_{l,t} x[e,d,l,t] = 0`
pub fn day_indicator(model: &mut HesmModel) {
    let layout = *model.layout();
    for e in 0..layout.employees {
        for d in 0..layout.days {
            let mut lhs = LinearExpr::new();
            lhs.add_term(layout.z(e, d), 1.0);
            for x in layout.x_day(e, d) {
                lhs.add_term(x, -1.0);
            }
            model.add_constraint(ConstraintFamily::DayIndicator, lhs, Relation::Eq, 0.0);
        }
    }
}
