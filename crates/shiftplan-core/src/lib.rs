//! # shiftplan-core
//!
//! Core domain model and traits for the shiftplan scheduling engine.
//!
//! This crate provides:
//! - Domain types: `Employee`, `EmployeeCategory`, `WorkCenter`, `Horizon`,
//!   `Shift`, `Assignment`, `Schedule`
//! - The staffing demand matrix (`demand`)
//! - Labor rules shared by the solver and the schedule audit
//! - Core traits: `ShiftScheduler`, `ScheduleStore`
//! - Error types and structured diagnostics
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use rust_decimal::Decimal;
//! use shiftplan_core::{DayType, DemandMatrix, Employee, EmployeeCategory, Horizon, WorkCenter, Workforce};
//!
//! let workforce = Workforce {
//!     categories: vec![EmployeeCategory::new(1, Decimal::new(100, 1))],
//!     employees: vec![Employee::new(1, 1).work_centers([1])],
//!     work_centers: vec![WorkCenter::new(1).demand(
//!         DemandMatrix::new()
//!             .with(DayType::Weekday, 1, [1, 0, 0])
//!             .with(DayType::Weekend, 1, [0, 0, 0]),
//!     )],
//! };
//! assert!(workforce.validate().is_ok());
//!
//! let horizon = Horizon::new(
//!     NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
//!     NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(),
//! )
//! .unwrap();
//! assert_eq!(horizon.days(), 7);
//! ```

pub mod audit;
pub mod demand;
pub mod quality;
pub mod store;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

pub use demand::{DemandGap, DemandLookup, DemandMatrix};
pub use store::{InMemoryStore, ScheduleStore, StoreError, StoredSchedule};

// ============================================================================
// Type Aliases & Constants
// ============================================================================

/// Unique identifier for an employee
pub type EmployeeId = u32;

/// Unique identifier for a work center
pub type WorkCenterId = u32;

/// Category identifier; doubles as the tier number (lower is solved first)
pub type CategoryId = u32;

/// Identifier assigned to a schedule by the store that persisted it
pub type ScheduleId = u64;

/// Shift slots of a day, 1-based
pub const SHIFT_SLOTS: [u8; 3] = [1, 2, 3];

/// Length of every shift in hours
pub const SHIFT_HOURS: i64 = 8;

/// Start hour of slot 1; later slots follow back to back
pub const FIRST_SHIFT_HOUR: i64 = 6;

// ============================================================================
// Calendar
// ============================================================================

/// Demand regime of a calendar day
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    /// Saturday and Sunday are weekend days
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => DayType::Weekend,
            _ => DayType::Weekday,
        }
    }

    /// Key used by the demand matrix
    pub fn as_str(self) -> &'static str {
        match self {
            DayType::Weekday => "weekday",
            DayType::Weekend => "weekend",
        }
    }
}

impl std::fmt::Display for DayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive date range a schedule is generated for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Horizon {
    /// Create a horizon; the end date must not precede the start date
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, GenerationError> {
        if end < start {
            return Err(GenerationError::InvalidInput(format!(
                "horizon end {} is before start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Number of days, both ends included
    pub fn days(&self) -> usize {
        ((self.end - self.start).num_days() + 1) as usize
    }

    /// Calendar date of a day offset
    pub fn date(&self, day: usize) -> NaiveDate {
        self.start + chrono::Duration::days(day as i64)
    }

    pub fn day_type(&self, day: usize) -> DayType {
        DayType::of(self.date(day))
    }

    /// Day offsets that fall on a weekend
    pub fn weekend_days(&self) -> Vec<usize> {
        (0..self.days())
            .filter(|&d| self.day_type(d) == DayType::Weekend)
            .collect()
    }

    /// Start time of `slot` on day offset `day`
    pub fn shift_start(&self, day: usize, slot: u8) -> NaiveDateTime {
        self.date(day).and_time(NaiveTime::default())
            + chrono::Duration::hours(FIRST_SHIFT_HOUR + (i64::from(slot) - 1) * SHIFT_HOURS)
    }

    /// Day offset of a date, if it lies inside the horizon
    pub fn offset_of(&self, date: NaiveDate) -> Option<usize> {
        if date < self.start || date > self.end {
            return None;
        }
        Some((date - self.start).num_days() as usize)
    }
}

// ============================================================================
// Workforce
// ============================================================================

/// Pay/skill category; its id is the tier number
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeCategory {
    pub id: CategoryId,
    #[serde(default)]
    pub name: String,
    pub hourly_rate: Decimal,
}

impl EmployeeCategory {
    pub fn new(id: CategoryId, hourly_rate: Decimal) -> Self {
        Self {
            id,
            name: format!("category-{}", id),
            hourly_rate,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// A schedulable person
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    #[serde(default)]
    pub name: String,
    pub category_id: CategoryId,
    /// Weekday name -> rank (1 = most preferred day off)
    #[serde(default)]
    pub off_day_preferences: BTreeMap<String, u8>,
    /// Shift slots in order of preference
    #[serde(default)]
    pub shift_preferences: Vec<u8>,
    /// Acceptable work centers in order of preference; never assigned outside
    #[serde(default)]
    pub work_center_preferences: Vec<WorkCenterId>,
    /// Desired number of shifts over the horizon
    #[serde(default, alias = "delta")]
    pub target_workload: f64,
}

impl Employee {
    pub fn new(id: EmployeeId, category_id: CategoryId) -> Self {
        Self {
            id,
            name: format!("employee-{}", id),
            category_id,
            off_day_preferences: BTreeMap::new(),
            shift_preferences: SHIFT_SLOTS.to_vec(),
            work_center_preferences: Vec::new(),
            target_workload: 0.0,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the acceptable work centers (in preference order)
    pub fn work_centers(mut self, ids: impl IntoIterator<Item = WorkCenterId>) -> Self {
        self.work_center_preferences = ids.into_iter().collect();
        self
    }

    /// Set the shift slot preference order
    pub fn shifts(mut self, slots: impl IntoIterator<Item = u8>) -> Self {
        self.shift_preferences = slots.into_iter().collect();
        self
    }

    /// Rank a weekday as a preferred day off
    pub fn off_day(mut self, weekday: impl Into<String>, rank: u8) -> Self {
        self.off_day_preferences.insert(weekday.into(), rank);
        self
    }

    pub fn target_workload(mut self, shifts: f64) -> Self {
        self.target_workload = shifts;
        self
    }

    pub fn accepts(&self, work_center: WorkCenterId) -> bool {
        self.work_center_preferences.contains(&work_center)
    }

    /// Off-day rank for a weekday; keys may be full or abbreviated names
    pub fn off_day_rank(&self, weekday: Weekday) -> Option<u8> {
        self.off_day_preferences
            .iter()
            .find(|(name, _)| name.parse::<Weekday>().ok() == Some(weekday))
            .map(|(_, &rank)| rank)
    }
}

/// A place where shifts are worked
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCenter {
    pub id: WorkCenterId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub demand: DemandMatrix,
}

impl WorkCenter {
    pub fn new(id: WorkCenterId) -> Self {
        Self {
            id,
            name: format!("work-center-{}", id),
            demand: DemandMatrix::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn demand(mut self, demand: DemandMatrix) -> Self {
        self.demand = demand;
        self
    }
}

/// All input entities of one generation run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Workforce {
    #[serde(default)]
    pub categories: Vec<EmployeeCategory>,
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub work_centers: Vec<WorkCenter>,
}

impl Workforce {
    pub fn category(&self, id: CategoryId) -> Option<&EmployeeCategory> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn employee(&self, id: EmployeeId) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    pub fn work_center(&self, id: WorkCenterId) -> Option<&WorkCenter> {
        self.work_centers.iter().find(|w| w.id == id)
    }

    /// Tier numbers in solve order: every category id, ascending
    pub fn tiers(&self) -> Vec<CategoryId> {
        let tiers: BTreeSet<CategoryId> = self.categories.iter().map(|c| c.id).collect();
        tiers.into_iter().collect()
    }

    /// Check referential integrity of the input
    pub fn validate(&self) -> Result<(), GenerationError> {
        let mut seen = BTreeSet::new();
        for category in &self.categories {
            if !seen.insert(category.id) {
                return Err(GenerationError::InvalidInput(format!(
                    "duplicate category id {}",
                    category.id
                )));
            }
        }

        let mut seen = BTreeSet::new();
        for center in &self.work_centers {
            if !seen.insert(center.id) {
                return Err(GenerationError::InvalidInput(format!(
                    "duplicate work center id {}",
                    center.id
                )));
            }
        }

        let mut seen = BTreeSet::new();
        for employee in &self.employees {
            if !seen.insert(employee.id) {
                return Err(GenerationError::InvalidInput(format!(
                    "duplicate employee id {}",
                    employee.id
                )));
            }
            if self.category(employee.category_id).is_none() {
                return Err(GenerationError::UnknownCategory {
                    employee: employee.id,
                    category: employee.category_id,
                });
            }
        }
        Ok(())
    }

    /// Every demand entry a generation run would have to skip
    pub fn demand_gaps(&self) -> Vec<DemandGap> {
        let tiers = self.tiers();
        self.work_centers
            .iter()
            .flat_map(|center| demand::gaps_for(center, &tiers))
            .collect()
    }
}

// ============================================================================
// Labor Rules
// ============================================================================

/// Per-employee working-time rules enforced by the optimal path
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaborRules {
    /// Shifts allowed in any 7 consecutive days
    pub max_shifts_per_week: u32,
    /// Longest run of consecutive worked days
    pub max_consecutive_days: u32,
    /// Weekend days each employee keeps free over the horizon
    pub weekend_days_off: u32,
    /// Forbid shifts on two calendar-adjacent days
    pub forbid_back_to_back: bool,
}

impl Default for LaborRules {
    fn default() -> Self {
        Self {
            max_shifts_per_week: 5,
            max_consecutive_days: 5,
            weekend_days_off: 2,
            forbid_back_to_back: true,
        }
    }
}

// ============================================================================
// Schedule (Result)
// ============================================================================

/// A concrete shift worked by one employee at one work center
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub employee_id: EmployeeId,
    pub work_center_id: WorkCenterId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Shift {
    /// Build the shift for slot `slot` on day offset `day`
    pub fn for_slot(
        horizon: &Horizon,
        day: usize,
        slot: u8,
        employee_id: EmployeeId,
        work_center_id: WorkCenterId,
    ) -> Self {
        let start = horizon.shift_start(day, slot);
        Self {
            employee_id,
            work_center_id,
            start,
            end: start + chrono::Duration::hours(SHIFT_HOURS),
        }
    }
}

/// Which path of the engine produced an assignment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSource {
    Optimal,
    Heuristic,
}

/// Links one shift to the schedule being generated
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub shift: Shift,
    /// Tier that placed the employee
    pub tier: CategoryId,
    /// Day offset inside the horizon
    pub day: usize,
    pub slot: u8,
    pub source: AssignmentSource,
}

/// How a tier was resolved
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierStatus {
    Optimal,
    Heuristic,
}

/// Summary of one processed tier
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierOutcome {
    pub tier: CategoryId,
    pub pool_size: usize,
    pub status: TierStatus,
    pub assignments: usize,
    pub cost: Decimal,
}

/// The result of one generation run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub assignments: Vec<Assignment>,
    /// Labor cost: hourly rate x shift hours, summed over assignments
    pub total_cost: Decimal,
    pub tiers: Vec<TierOutcome>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl Schedule {
    pub fn horizon(&self) -> Horizon {
        Horizon {
            start: self.start_date,
            end: self.end_date,
        }
    }

    pub fn assignments_for(&self, employee: EmployeeId) -> impl Iterator<Item = &Assignment> {
        self.assignments
            .iter()
            .filter(move |a| a.shift.employee_id == employee)
    }

    /// Number of assignments covering a (day, work center, slot) cell
    pub fn staffed(&self, day: usize, work_center: WorkCenterId, slot: u8) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.day == day && a.slot == slot && a.shift.work_center_id == work_center)
            .count()
    }

    /// Flatten into the records consumers read back
    pub fn generated_records(&self, schedule_id: ScheduleId) -> Vec<GeneratedSchedule> {
        self.assignments
            .iter()
            .map(|a| GeneratedSchedule {
                schedule_id,
                employee_id: a.shift.employee_id,
                work_center_id: a.shift.work_center_id,
                shift_start: a.shift.start,
                shift_end: a.shift.end,
            })
            .collect()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}

/// Flattened, queryable record of one assignment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSchedule {
    pub schedule_id: ScheduleId,
    pub employee_id: EmployeeId,
    pub work_center_id: WorkCenterId,
    pub shift_start: NaiveDateTime,
    pub shift_end: NaiveDateTime,
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Severity of a diagnostic
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Stable diagnostic codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Tier solved to optimality
    I001TierOptimal,
    /// Demand matrix has no entry for a (day type, tier, slot) cell
    W001MissingDemand,
    /// Tier model was not optimal; greedy fill used instead
    W002HeuristicFallback,
    /// Heuristic could not staff a cell completely
    W003UnderfilledCell,
    /// Earlier tiers already exceed this tier's demand for a cell
    W004NegativeResidualDemand,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::I001TierOptimal => "I001",
            DiagnosticCode::W001MissingDemand => "W001",
            DiagnosticCode::W002HeuristicFallback => "W002",
            DiagnosticCode::W003UnderfilledCell => "W003",
            DiagnosticCode::W004NegativeResidualDemand => "W004",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal finding collected during generation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub tier: Option<CategoryId>,
}

impl Diagnostic {
    pub fn info(code: DiagnosticCode, tier: CategoryId, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Info,
            message: message.into(),
            tier: Some(tier),
        }
    }

    pub fn warning(code: DiagnosticCode, tier: CategoryId, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Warning,
            message: message.into(),
            tier: Some(tier),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity.as_str(), self.code, self.message)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Sink for diagnostics produced while generating or checking a schedule
pub trait DiagnosticEmitter {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Core scheduling abstraction
pub trait ShiftScheduler: Send + Sync {
    /// Assign shifts for the whole horizon; either a complete schedule or an error
    fn generate(&self, workforce: &Workforce, horizon: &Horizon) -> Result<Schedule, GenerationError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Schedule generation error
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Employee {employee} references unknown category {category}")]
    UnknownCategory {
        employee: EmployeeId,
        category: CategoryId,
    },

    #[error("Tier iteration limit of {limit} exceeded")]
    DepthLimitExceeded { limit: usize },

    #[error("Persistence failed: {0}")]
    Persistence(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

// ============================================================================
// Tests
// ============================================================================
