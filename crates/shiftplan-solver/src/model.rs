//! Solver-neutral linear model
//!
//! The model builder writes the HESM integer program into these types; a
//! [`SolverBackend`](crate::backend::SolverBackend) translates them for a
//! concrete MILP library. Keeping the model library-free lets tests inspect
//! constraint families directly and lets the engine run against scripted
//! backends.

use shiftplan_core::CategoryId;

/// Handle to a model variable
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Variable domain
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Binary,
    NonNegative,
}

/// `Σ coef·var + constant`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unit-coefficient sum of `vars`
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) {
        self.terms.push((var, coef));
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    /// Add `coef·other` term by term
    pub fn add_scaled(&mut self, other: &LinearExpr, coef: f64) {
        self.terms
            .extend(other.terms.iter().map(|&(v, c)| (v, c * coef)));
        self.constant += other.constant * coef;
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// True when no variable carries a nonzero coefficient
    pub fn is_constant(&self) -> bool {
        self.terms.iter().all(|&(_, c)| c == 0.0)
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|&(v, c)| c * values.get(v.0).copied().unwrap_or(0.0))
                .sum::<f64>()
    }
}

/// Comparison of a constraint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    Eq,
    Le,
    Ge,
}

/// Constraint families of the tier model
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConstraintFamily {
    DemandCoverage,
    OneShiftPerDay,
    WeeklyCap,
    ConsecutiveDays,
    WeekendOff,
    SingleWorkCenter,
    BackToBack,
    WorkloadDeviation,
    SymmetryBreaking,
    AssignmentConsistency,
    PreferenceExclusion,
    DayIndicator,
}

const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// `lhs <relation> rhs`
#[derive(Clone, Debug, PartialEq)]
pub struct LinearConstraint {
    pub family: ConstraintFamily,
    pub lhs: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn is_satisfied_by(&self, values: &[f64]) -> bool {
        let lhs = self.lhs.evaluate(values);
        match self.relation {
            Relation::Eq => (lhs - self.rhs).abs() <= FEASIBILITY_TOLERANCE,
            Relation::Le => lhs <= self.rhs + FEASIBILITY_TOLERANCE,
            Relation::Ge => lhs + FEASIBILITY_TOLERANCE >= self.rhs,
        }
    }

    /// For variable-free constraints, whether they hold
    pub fn trivially_holds(&self) -> Option<bool> {
        self.lhs
            .is_constant()
            .then(|| self.is_satisfied_by(&[]))
    }
}

/// Index arithmetic for the `x`, `w`, `z` and `v` variable blocks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VarLayout {
    pub employees: usize,
    pub days: usize,
    pub work_centers: usize,
    pub slots: usize,
}

impl VarLayout {
    fn x_len(&self) -> usize {
        self.employees * self.days * self.work_centers * self.slots
    }

    fn w_base(&self) -> usize {
        self.x_len()
    }

    fn z_base(&self) -> usize {
        self.w_base() + self.employees * self.work_centers
    }

    fn v_base(&self) -> usize {
        self.z_base() + self.employees * self.days
    }

    pub fn total(&self) -> usize {
        self.v_base() + self.employees
    }

    /// Employee `e` works center `l`, slot index `t` (0-based) on day `d`
    pub fn x(&self, e: usize, d: usize, l: usize, t: usize) -> VarId {
        VarId(((e * self.days + d) * self.work_centers + l) * self.slots + t)
    }

    /// Employee `e` is selected for center `l`
    pub fn w(&self, e: usize, l: usize) -> VarId {
        VarId(self.w_base() + e * self.work_centers + l)
    }

    /// Employee `e` works on day `d`
    pub fn z(&self, e: usize, d: usize) -> VarId {
        VarId(self.z_base() + e * self.days + d)
    }

    /// Workload deviation of employee `e`
    pub fn v(&self, e: usize) -> VarId {
        VarId(self.v_base() + e)
    }

    /// Every `x` of employee `e` on day `d`
    pub fn x_day(&self, e: usize, d: usize) -> impl Iterator<Item = VarId> + '_ {
        (0..self.work_centers)
            .flat_map(move |l| (0..self.slots).map(move |t| self.x(e, d, l, t)))
    }

    /// Every `x` of employee `e` over days `days`
    pub fn x_days(
        &self,
        e: usize,
        days: std::ops::Range<usize>,
    ) -> impl Iterator<Item = VarId> + '_ {
        days.flat_map(move |d| self.x_day(e, d))
    }

    /// Every `w` of employee `e`
    pub fn w_all(&self, e: usize) -> impl Iterator<Item = VarId> + '_ {
        (0..self.work_centers).map(move |l| self.w(e, l))
    }
}

/// The integer program of one tier
#[derive(Clone, Debug)]
pub struct HesmModel {
    tier: CategoryId,
    layout: VarLayout,
    kinds: Vec<VarKind>,
    objective: LinearExpr,
    constraints: Vec<LinearConstraint>,
}

impl HesmModel {
    /// Allocate the `x`, `w`, `z` (binary) and `v` (continuous) blocks
    pub fn new(tier: CategoryId, layout: VarLayout) -> Self {
        let mut kinds = vec![VarKind::Binary; layout.total()];
        for e in 0..layout.employees {
            kinds[layout.v(e).0] = VarKind::NonNegative;
        }
        Self {
            tier,
            layout,
            kinds,
            objective: LinearExpr::new(),
            constraints: Vec::new(),
        }
    }

    pub fn tier(&self) -> CategoryId {
        self.tier
    }

    pub fn layout(&self) -> &VarLayout {
        &self.layout
    }

    pub fn kinds(&self) -> &[VarKind] {
        &self.kinds
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn add_constraint(
        &mut self,
        family: ConstraintFamily,
        lhs: LinearExpr,
        relation: Relation,
        rhs: f64,
    ) {
        self.constraints.push(LinearConstraint {
            family,
            lhs,
            relation,
            rhs,
        });
    }

    /// Number of constraints of one family
    pub fn count(&self, family: ConstraintFamily) -> usize {
        self.constraints
            .iter()
            .filter(|c| c.family == family)
            .count()
    }

    /// Whether `values` satisfy every constraint and variable domain
    pub fn is_feasible(&self, values: &[f64]) -> bool {
        if values.len() != self.kinds.len() {
            return false;
        }
        let domains_ok = self.kinds.iter().zip(values).all(|(kind, &v)| match kind {
            VarKind::Binary => v.abs() < FEASIBILITY_TOLERANCE || (v - 1.0).abs() < FEASIBILITY_TOLERANCE,
            VarKind::NonNegative => v >= -FEASIBILITY_TOLERANCE,
        });
        domains_ok && self.constraints.iter().all(|c| c.is_satisfied_by(values))
    }
}
