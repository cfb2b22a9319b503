//! HESM model builder
//!
//! Builds the integer program of one tier from the workable pool, the
//! horizon, the work centers and the demand already covered by earlier tiers.
//!
//! # Objective
//!
//! ```text
//! minimize  Σ rate·w[e,l]
//!         + penalty · Σ_{l ∉ prefs(e)} w[e,l]
//!         + Σ (C1[e,l,t] + C2[e,l,t]) · x[e,d,l,t]
//!         + Σ_{e,d,l} C3[e,d] · (w[e,l] − z[e,d])
//!         + Σ v[e]
//! ```
//!
//! C1 and C2 are drawn per (employee, work center, slot), C3 per
//! (employee, day), uniformly from `[0, 1)`: all C1 first, then all C2, then
//! all C3, employees in pool order.

use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use shiftplan_core::{CategoryId, Diagnostic, Employee, Horizon, WorkCenter, SHIFT_SLOTS};

use crate::config::ResolvedTier;
use crate::constraints;
use crate::extract::DemandLedger;
use crate::model::{HesmModel, LinearExpr, VarLayout};

/// Everything a tier needs to be modelled or filled greedily
#[derive(Debug)]
pub struct TierContext<'a> {
    pub tier: CategoryId,
    /// Phi′ in arena order
    pub pool: &'a [&'a Employee],
    pub hourly_rate: Decimal,
    pub horizon: &'a Horizon,
    pub work_centers: &'a [WorkCenter],
    /// Headcount placed by earlier tiers
    pub ledger: &'a DemandLedger,
    pub settings: &'a ResolvedTier,
    pub unpreferred_penalty: f64,
}

impl TierContext<'_> {
    pub fn layout(&self) -> VarLayout {
        VarLayout {
            employees: self.pool.len(),
            days: self.horizon.days(),
            work_centers: self.work_centers.len(),
            slots: SHIFT_SLOTS.len(),
        }
    }
}

/// Random objective weights of one tier
#[derive(Clone, Debug, PartialEq)]
pub struct PreferenceWeights {
    layout: VarLayout,
    c1: Vec<f64>,
    c2: Vec<f64>,
    c3: Vec<f64>,
}

impl PreferenceWeights {
    pub fn draw<R: Rng + ?Sized>(rng: &mut R, layout: VarLayout) -> Self {
        let per_center = layout.employees * layout.work_centers * layout.slots;
        let c1 = (0..per_center).map(|_| rng.random::<f64>()).collect();
        let c2 = (0..per_center).map(|_| rng.random::<f64>()).collect();
        let c3 = (0..layout.employees * layout.days)
            .map(|_| rng.random::<f64>())
            .collect();
        Self { layout, c1, c2, c3 }
    }

    pub fn c1(&self, e: usize, l: usize, t: usize) -> f64 {
        self.c1[self.center_index(e, l, t)]
    }

    pub fn c2(&self, e: usize, l: usize, t: usize) -> f64 {
        self.c2[self.center_index(e, l, t)]
    }

    pub fn c3(&self, e: usize, d: usize) -> f64 {
        self.c3[e * self.layout.days + d]
    }

    fn center_index(&self, e: usize, l: usize, t: usize) -> usize {
        (e * self.layout.work_centers + l) * self.layout.slots + t
    }
}

/// A built tier model plus the findings collected while building it
#[derive(Debug)]
pub struct ModelBuild {
    pub model: HesmModel,
    pub diagnostics: Vec<Diagnostic>,
}

/// Draw the tier's weights from `rng` and build its model
pub fn build_model<R: Rng + ?Sized>(ctx: &TierContext<'_>, rng: &mut R) -> ModelBuild {
    let layout = ctx.layout();
    let weights = PreferenceWeights::draw(rng, layout);
    build_with_weights(ctx, &weights)
}

pub fn build_with_weights(ctx: &TierContext<'_>, weights: &PreferenceWeights) -> ModelBuild {
    let mut model = HesmModel::new(ctx.tier, ctx.layout());
    model.set_objective(objective(ctx, weights));
    let diagnostics = constraints::add_all(&mut model, ctx);
    ModelBuild { model, diagnostics }
}

fn objective(ctx: &TierContext<'_>, weights: &PreferenceWeights) -> LinearExpr {
    let layout = ctx.layout();
    let rate = ctx.hourly_rate.to_f64().unwrap_or(0.0);
    let mut objective = LinearExpr::new();

    for (e, employee) in ctx.pool.iter().enumerate() {
        // C3 term: Σ_{d,l} C3[e,d]·(w[e,l] − z[e,d]); z picks up one C3 per center
        let off_day_weight: f64 = (0..layout.days).map(|d| weights.c3(e, d)).sum();

        for (l, center) in ctx.work_centers.iter().enumerate() {
            let mut w_coef = rate + off_day_weight;
            if !employee.accepts(center.id) {
                w_coef += ctx.unpreferred_penalty;
            }
            objective.add_term(layout.w(e, l), w_coef);

            for d in 0..layout.days {
                for t in 0..layout.slots {
                    objective.add_term(
                        layout.x(e, d, l, t),
                        weights.c1(e, l, t) + weights.c2(e, l, t),
                    );
                }
            }
        }

        let centers = layout.work_centers as f64;
        for d in 0..layout.days {
            objective.add_term(layout.z(e, d), -centers * weights.c3(e, d));
        }
        objective.add_term(layout.v(e), 1.0);
    }
    objective
}
