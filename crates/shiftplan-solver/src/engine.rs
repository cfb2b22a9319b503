//! Tiered schedule generation
//!
//! Tiers are processed in ascending category order. Each tier runs through an
//! explicit state machine:
//!
//! ```text
//! TierStart(k) -> BuildModel -> Solve -> Extract   -> UpdatePool -> TierStart(k+1) | Done
//!                                     \-> Heuristic -/
//! ```
//!
//! A tier whose model is not solved to optimality is filled greedily. Every
//! entry into `TierStart` counts against the configured depth limit.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;

use shiftplan_core::{
    Assignment, CategoryId, Diagnostic, DiagnosticCode, Employee, GenerationError, Horizon,
    Schedule, ScheduleId, ScheduleStore, Severity, ShiftScheduler, TierOutcome, TierStatus,
    Workforce,
};

use crate::backend::{GoodLpBackend, SolveStatus, SolverBackend};
use crate::builder::{build_model, TierContext};
use crate::config::{ResolvedTier, SchedulerConfig};
use crate::extract::{extract_assignments, CostAccumulator, DemandLedger};
use crate::heuristic;
use crate::model::HesmModel;
use crate::pool::PoolManager;

// ============================================================================
// Scheduler
// ============================================================================

/// Tier-by-tier scheduler: optimal model per tier, greedy fill as fallback
#[derive(Clone, Debug)]
pub struct TieredScheduler<B: SolverBackend = GoodLpBackend> {
    config: SchedulerConfig,
    backend: B,
}

impl TieredScheduler<GoodLpBackend> {
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_backend(config, GoodLpBackend::new())
    }
}

impl Default for TieredScheduler<GoodLpBackend> {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl<B: SolverBackend> TieredScheduler<B> {
    pub fn with_backend(config: SchedulerConfig, backend: B) -> Self {
        Self { config, backend }
    }

    /// Replace the preference-weight seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: SolverBackend> ShiftScheduler for TieredScheduler<B> {
    fn generate(&self, workforce: &Workforce, horizon: &Horizon) -> Result<Schedule, GenerationError> {
        workforce.validate()?;
        tracing::info!(
            start = %horizon.start,
            end = %horizon.end,
            employees = workforce.employees.len(),
            work_centers = workforce.work_centers.len(),
            backend = self.backend.name(),
            seed = self.config.seed,
            "generating schedule"
        );

        let mut run = Run::new(&self.config, &self.backend, workforce, horizon);
        let mut phase = Phase::TierStart(0);
        loop {
            phase = run.step(phase)?;
            tracing::debug!(phase = phase.name(), "transition");
            if matches!(phase, Phase::Done) {
                break;
            }
        }
        Ok(run.finish())
    }
}

/// Generate, then commit the finished schedule in one step
///
/// Nothing reaches the store unless generation succeeded.
pub fn generate_and_persist<S, T>(
    scheduler: &S,
    store: &mut T,
    workforce: &Workforce,
    horizon: &Horizon,
) -> Result<(ScheduleId, Schedule), GenerationError>
where
    S: ShiftScheduler + ?Sized,
    T: ScheduleStore + ?Sized,
{
    let schedule = scheduler.generate(workforce, horizon)?;
    let id = store.commit(&schedule)?;
    tracing::info!(schedule_id = id, assignments = schedule.assignments.len(), "schedule stored");
    Ok((id, schedule))
}

// ============================================================================
// State Machine
// ============================================================================

/// Pool and settings of the tier being processed
#[derive(Debug)]
struct TierWork<'a> {
    tier: CategoryId,
    pool: Vec<&'a Employee>,
    hourly_rate: Decimal,
    settings: ResolvedTier,
}

#[derive(Debug)]
enum Phase<'a> {
    /// Index into the tier list
    TierStart(usize),
    BuildModel {
        index: usize,
        work: TierWork<'a>,
    },
    Solve {
        index: usize,
        work: TierWork<'a>,
        model: HesmModel,
    },
    Extract {
        index: usize,
        work: TierWork<'a>,
        model: HesmModel,
        values: Vec<f64>,
    },
    Heuristic {
        index: usize,
        work: TierWork<'a>,
    },
    UpdatePool {
        index: usize,
        work: TierWork<'a>,
        assignments: Vec<Assignment>,
        status: TierStatus,
    },
    Done,
}

impl Phase<'_> {
    fn name(&self) -> &'static str {
        match self {
            Phase::TierStart(_) => "tier_start",
            Phase::BuildModel { .. } => "build_model",
            Phase::Solve { .. } => "solve",
            Phase::Extract { .. } => "extract",
            Phase::Heuristic { .. } => "heuristic",
            Phase::UpdatePool { .. } => "update_pool",
            Phase::Done => "done",
        }
    }
}

fn tier_context<'w>(
    work: &'w TierWork<'_>,
    horizon: &'w Horizon,
    workforce: &'w Workforce,
    ledger: &'w DemandLedger,
    unpreferred_penalty: f64,
) -> TierContext<'w> {
    TierContext {
        tier: work.tier,
        pool: &work.pool,
        hourly_rate: work.hourly_rate,
        horizon,
        work_centers: &workforce.work_centers,
        ledger,
        settings: &work.settings,
        unpreferred_penalty,
    }
}

/// Mutable state of one generation run
struct Run<'a, B> {
    config: &'a SchedulerConfig,
    backend: &'a B,
    workforce: &'a Workforce,
    horizon: &'a Horizon,
    tiers: Vec<CategoryId>,
    pool: PoolManager<'a>,
    ledger: DemandLedger,
    cost: CostAccumulator,
    rng: StdRng,
    depth: usize,
    assignments: Vec<Assignment>,
    outcomes: Vec<TierOutcome>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a, B: SolverBackend> Run<'a, B> {
    fn new(
        config: &'a SchedulerConfig,
        backend: &'a B,
        workforce: &'a Workforce,
        horizon: &'a Horizon,
    ) -> Self {
        let pool = PoolManager::new(workforce);
        Self {
            config,
            backend,
            workforce,
            horizon,
            tiers: pool.tiers().to_vec(),
            pool,
            ledger: DemandLedger::new(),
            cost: CostAccumulator::new(),
            rng: StdRng::seed_from_u64(config.seed),
            depth: 0,
            assignments: Vec::new(),
            outcomes: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn report(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            if !self.diagnostics.contains(&diagnostic) {
                self.diagnostics.push(diagnostic);
            }
        }
    }

    fn step(&mut self, phase: Phase<'a>) -> Result<Phase<'a>, GenerationError> {
        let next = match phase {
            Phase::TierStart(index) => {
                let Some(&tier) = self.tiers.get(index) else {
                    return Ok(Phase::Done);
                };
                self.depth += 1;
                if self.depth > self.config.max_depth {
                    return Err(GenerationError::DepthLimitExceeded {
                        limit: self.config.max_depth,
                    });
                }
                let category = self.workforce.category(tier).ok_or_else(|| {
                    GenerationError::Internal(format!("tier {} has no category", tier))
                })?;
                let work = TierWork {
                    tier,
                    pool: self.pool.workable(tier),
                    hourly_rate: category.hourly_rate,
                    settings: self.config.resolve(tier),
                };
                tracing::info!(
                    tier,
                    pool = work.pool.len(),
                    placed = self.pool.placed().len(),
                    "starting tier"
                );
                Phase::BuildModel { index, work }
            }

            Phase::BuildModel { index, work } => {
                let ctx = tier_context(
                    &work,
                    self.horizon,
                    self.workforce,
                    &self.ledger,
                    self.config.unpreferred_penalty,
                );
                let build = build_model(&ctx, &mut self.rng);
                tracing::debug!(
                    tier = work.tier,
                    variables = build.model.kinds().len(),
                    constraints = build.model.constraints().len(),
                    "model built"
                );
                self.report(build.diagnostics);
                Phase::Solve {
                    index,
                    work,
                    model: build.model,
                }
            }

            Phase::Solve { index, work, model } => {
                let outcome = self.backend.solve(&model);
                let reason = match outcome.status {
                    SolveStatus::Optimal => {
                        return Ok(Phase::Extract {
                            index,
                            work,
                            model,
                            values: outcome.values,
                        })
                    }
                    SolveStatus::Infeasible => "infeasible".to_string(),
                    SolveStatus::NotSolved(msg) => msg,
                };
                tracing::warn!(tier = work.tier, %reason, "model not optimal, using heuristic");
                self.report([Diagnostic::warning(
                    DiagnosticCode::W002HeuristicFallback,
                    work.tier,
                    format!("tier {} model {}; filled greedily", work.tier, reason),
                )]);
                Phase::Heuristic { index, work }
            }

            Phase::Extract {
                index,
                work,
                model,
                values,
            } => {
                let assignments = extract_assignments(
                    &model,
                    &values,
                    &work.pool,
                    &self.workforce.work_centers,
                    self.horizon,
                );
                self.report([Diagnostic::info(
                    DiagnosticCode::I001TierOptimal,
                    work.tier,
                    format!(
                        "tier {} solved to optimality with {} assignments",
                        work.tier,
                        assignments.len()
                    ),
                )]);
                Phase::UpdatePool {
                    index,
                    work,
                    assignments,
                    status: TierStatus::Optimal,
                }
            }

            Phase::Heuristic { index, work } => {
                let fill = heuristic::fill(&tier_context(
                    &work,
                    self.horizon,
                    self.workforce,
                    &self.ledger,
                    self.config.unpreferred_penalty,
                ));
                self.report(fill.diagnostics);
                Phase::UpdatePool {
                    index,
                    work,
                    assignments: fill.assignments,
                    status: TierStatus::Heuristic,
                }
            }

            Phase::UpdatePool {
                index,
                work,
                assignments,
                status,
            } => {
                let cost = self.cost.add(&assignments, work.hourly_rate);
                self.ledger.record(&assignments);
                self.pool.mark_placed(&work.pool, &assignments);
                tracing::info!(
                    tier = work.tier,
                    ?status,
                    assignments = assignments.len(),
                    %cost,
                    "tier finished"
                );
                self.outcomes.push(TierOutcome {
                    tier: work.tier,
                    pool_size: work.pool.len(),
                    status,
                    assignments: assignments.len(),
                    cost,
                });
                self.assignments.extend(assignments);
                Phase::TierStart(index + 1)
            }

            Phase::Done => Phase::Done,
        };
        Ok(next)
    }

    fn finish(self) -> Schedule {
        tracing::info!(
            assignments = self.assignments.len(),
            total_cost = %self.cost.total(),
            warnings = self
                .diagnostics
                .iter()
                .filter(|d| d.severity == Severity::Warning)
                .count(),
            "schedule generated"
        );
        Schedule {
            start_date: self.horizon.start,
            end_date: self.horizon.end,
            assignments: self.assignments,
            total_cost: self.cost.total(),
            tiers: self.outcomes,
            diagnostics: self.diagnostics,
        }
    }
}
