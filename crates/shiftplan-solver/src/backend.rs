//! MILP solver adapter
//!
//! [`GoodLpBackend`] hands the tier model to `good_lp` (pure-Rust `microlp`
//! solver). Anything other than a proven optimum is reported as a non-optimal
//! status; the engine routes those tiers to the heuristic.

use good_lp::{
    default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};

use crate::model::{HesmModel, LinearExpr, Relation, VarKind};

/// Status reported by a backend
#[derive(Clone, Debug, PartialEq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    /// Unbounded, numerical trouble or any other solver failure
    NotSolved(String),
}

/// Result of solving one tier model
#[derive(Clone, Debug, PartialEq)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// One value per model variable; empty unless optimal
    pub values: Vec<f64>,
    pub objective: Option<f64>,
}

impl SolveOutcome {
    pub fn optimal(values: Vec<f64>, objective: f64) -> Self {
        Self {
            status: SolveStatus::Optimal,
            values,
            objective: Some(objective),
        }
    }

    pub fn infeasible() -> Self {
        Self::failed(SolveStatus::Infeasible)
    }

    pub fn failed(status: SolveStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective: None,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }
}

/// A mixed-integer solver the engine can delegate a tier model to
pub trait SolverBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, model: &HesmModel) -> SolveOutcome;
}

/// True when some variable-free constraint can never hold
pub fn violated_constant_constraint(model: &HesmModel) -> bool {
    model
        .constraints()
        .iter()
        .any(|c| c.trivially_holds() == Some(false))
}

/// `good_lp` backend with the `microlp` solver
#[derive(Clone, Copy, Debug, Default)]
pub struct GoodLpBackend;

impl GoodLpBackend {
    pub fn new() -> Self {
        Self
    }
}

fn to_expression(expr: &LinearExpr, vars: &[Variable]) -> Expression {
    let mut out = Expression::with_capacity(expr.terms().len());
    for &(var, coef) in expr.terms() {
        out.add_mul(coef, vars[var.index()]);
    }
    out
}

impl SolverBackend for GoodLpBackend {
    fn name(&self) -> &'static str {
        "good_lp/microlp"
    }

    fn solve(&self, model: &HesmModel) -> SolveOutcome {
        if violated_constant_constraint(model) {
            tracing::debug!(tier = model.tier(), "constant constraint violated, skipping solver");
            return SolveOutcome::infeasible();
        }
        if model.kinds().is_empty() {
            return SolveOutcome::optimal(Vec::new(), model.objective().constant());
        }

        let mut problem_vars = ProblemVariables::new();
        let vars: Vec<Variable> = model
            .kinds()
            .iter()
            .map(|kind| match kind {
                VarKind::Binary => problem_vars.add(variable().binary()),
                VarKind::NonNegative => problem_vars.add(variable().min(0.0)),
            })
            .collect();

        let objective = to_expression(model.objective(), &vars);
        let mut problem = problem_vars.minimise(objective).using(default_solver);

        for constraint in model.constraints() {
            if constraint.lhs.is_constant() {
                continue;
            }
            let lhs = to_expression(&constraint.lhs, &vars);
            let rhs = constraint.rhs - constraint.lhs.constant();
            problem = problem.with(match constraint.relation {
                Relation::Eq => lhs.eq(rhs),
                Relation::Le => lhs.leq(rhs),
                Relation::Ge => lhs.geq(rhs),
            });
        }

        match problem.solve() {
            Ok(solution) => {
                let values: Vec<f64> = vars.iter().map(|&v| solution.value(v)).collect();
                let objective_value = model.objective().evaluate(&values);
                SolveOutcome::optimal(values, objective_value)
            }
            Err(ResolutionError::Infeasible) => SolveOutcome::infeasible(),
            Err(other) => SolveOutcome::failed(SolveStatus::NotSolved(other.to_string())),
        }
    }
}
