//! Category partition and employee pool
//!
//! Employees live in one arena (the workforce's employee list) and never move.
//! The partition maps each tier to arena indices (Phi); the pool manager keeps
//! the ids already placed by earlier tiers (Omega) and derives the workable
//! subset of a tier (Phi′) by filtering against it.
//!
//! Categories partition the workforce, so the Omega filter never removes
//! anyone today; it is kept so that overlapping tier definitions would still
//! place each employee at most once.

use std::collections::{BTreeMap, BTreeSet};

use shiftplan_core::{Assignment, CategoryId, Employee, EmployeeId, Workforce};

/// Tier -> member indices, tiers in solve order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TierPartition {
    tiers: Vec<CategoryId>,
    members: BTreeMap<CategoryId, Vec<usize>>,
}

impl TierPartition {
    pub fn new(workforce: &Workforce) -> Self {
        let tiers = workforce.tiers();
        let mut members: BTreeMap<CategoryId, Vec<usize>> =
            tiers.iter().map(|&t| (t, Vec::new())).collect();
        for (idx, employee) in workforce.employees.iter().enumerate() {
            members.entry(employee.category_id).or_default().push(idx);
        }
        Self { tiers, members }
    }

    pub fn tiers(&self) -> &[CategoryId] {
        &self.tiers
    }

    pub fn members(&self, tier: CategoryId) -> &[usize] {
        self.members
            .get(&tier)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Tracks placed employees across tiers
#[derive(Debug)]
pub struct PoolManager<'a> {
    employees: &'a [Employee],
    partition: TierPartition,
    placed: BTreeSet<EmployeeId>,
}

impl<'a> PoolManager<'a> {
    pub fn new(workforce: &'a Workforce) -> Self {
        Self {
            employees: &workforce.employees,
            partition: TierPartition::new(workforce),
            placed: BTreeSet::new(),
        }
    }

    pub fn tiers(&self) -> &[CategoryId] {
        self.partition.tiers()
    }

    /// Phi′: members of `tier` not yet placed, in arena order
    pub fn workable(&self, tier: CategoryId) -> Vec<&'a Employee> {
        let employees = self.employees;
        self.partition
            .members(tier)
            .iter()
            .map(|&idx| &employees[idx])
            .filter(|e| !self.placed.contains(&e.id))
            .collect()
    }

    /// Add every employee of `pool` that received an assignment to Omega
    pub fn mark_placed(&mut self, pool: &[&Employee], assignments: &[Assignment]) {
        let assigned: BTreeSet<EmployeeId> =
            assignments.iter().map(|a| a.shift.employee_id).collect();
        self.placed.extend(
            pool.iter()
                .map(|e| e.id)
                .filter(|id| assigned.contains(id)),
        );
    }

    /// Omega
    pub fn placed(&self) -> &BTreeSet<EmployeeId> {
        &self.placed
    }
}
