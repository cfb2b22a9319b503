//! # shiftplan-solver
//!
//! Tiered shift assignment: one mixed-integer program (the HESM model) per
//! employee category, solved in ascending tier order, with a greedy fill for
//! tiers whose model has no optimal solution.
//!
//! This crate provides:
//! - A solver-neutral linear model and its constraint families
//! - The `good_lp` backend and the `SolverBackend` seam for other solvers
//! - The greedy fallback, pool manager and cost accumulation
//! - `TieredScheduler`, an implementation of `ShiftScheduler`
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use shiftplan_core::{Horizon, InMemoryStore, Workforce};
//! use shiftplan_solver::{generate_and_persist, SchedulerConfig, TieredScheduler};
//!
//! # fn main() -> Result<(), shiftplan_core::GenerationError> {
//! let workforce = Workforce::default();
//! let horizon = Horizon::new(
//!     NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
//!     NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(),
//! )?;
//!
//! let scheduler = TieredScheduler::new(SchedulerConfig::default().seed(42));
//! let mut store = InMemoryStore::new();
//! let (id, schedule) = generate_and_persist(&scheduler, &mut store, &workforce, &horizon)?;
//! println!("schedule {} costs {}", id, schedule.total_cost);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod builder;
pub mod config;
pub mod constraints;
pub mod engine;
pub mod extract;
pub mod heuristic;
pub mod model;
pub mod pool;

pub use backend::{GoodLpBackend, SolveOutcome, SolveStatus, SolverBackend};
pub use builder::{build_model, ModelBuild, PreferenceWeights, TierContext};
pub use config::{ConfigError, ResolvedTier, SchedulerConfig, TierPolicy};
pub use engine::{generate_and_persist, TieredScheduler};
pub use extract::{CostAccumulator, DemandLedger};
pub use model::{ConstraintFamily, HesmModel, LinearConstraint, LinearExpr, Relation, VarId, VarKind, VarLayout};
pub use pool::{PoolManager, TierPartition};
