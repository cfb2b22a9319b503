//! Scheduler configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! seed = 7
//! target_workload = 20.0
//!
//! [rules]
//! weekend_days_off = 2
//!
//! [tiers."2"]
//! weekend_days_off = 1
//! target_workload = 10.0
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use shiftplan_core::{CategoryId, LaborRules};

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Per-tier overrides
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierPolicy {
    pub weekend_days_off: Option<u32>,
    pub target_workload: Option<f64>,
}

/// Effective settings for one tier
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedTier {
    pub rules: LaborRules,
    /// Δ_k: shift count each employee's workload is pulled towards
    pub target_workload: f64,
}

/// Options for the tiered scheduler
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seed of the preference-weight generator
    pub seed: u64,
    /// Default Δ_k for every tier
    pub target_workload: f64,
    /// Objective weight on selecting an unpreferred work center
    pub unpreferred_penalty: f64,
    /// Upper bound on tier iterations per run
    pub max_depth: usize,
    pub rules: LaborRules,
    /// Overrides keyed by tier id (as a string, like the demand matrix)
    pub tiers: BTreeMap<String, TierPolicy>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            target_workload: 20.0,
            unpreferred_penalty: 1000.0,
            max_depth: 1000,
            rules: LaborRules::default(),
            tiers: BTreeMap::new(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn rules(mut self, rules: LaborRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Rules and Δ_k for a tier after applying overrides
    pub fn resolve(&self, tier: CategoryId) -> ResolvedTier {
        let policy = self.tiers.get(&tier.to_string());
        let mut rules = self.rules.clone();
        if let Some(days) = policy.and_then(|p| p.weekend_days_off) {
            rules.weekend_days_off = days;
        }
        ResolvedTier {
            rules,
            target_workload: policy
                .and_then(|p| p.target_workload)
                .unwrap_or(self.target_workload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_is_default() {
        let config = SchedulerConfig::from_toml_str("").unwrap();
        assert_eq!(config, SchedulerConfig::default());
        assert_eq!(config.rules.weekend_days_off, 2);
        assert_eq!(config.target_workload, 20.0);
    }

    #[test]
    fn tier_overrides_apply_to_their_tier_only() {
        let config = SchedulerConfig::from_toml_str(
            r#"
            seed = 11

            [rules]
            max_shifts_per_week = 4

            [tiers."2"]
            weekend_days_off = 1
            target_workload = 3.0
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, 11);
        let tier1 = config.resolve(1);
        assert_eq!(tier1.rules.weekend_days_off, 2);
        assert_eq!(tier1.rules.max_shifts_per_week, 4);
        assert_eq!(tier1.target_workload, 20.0);

        let tier2 = config.resolve(2);
        assert_eq!(tier2.rules.weekend_days_off, 1);
        assert_eq!(tier2.rules.max_shifts_per_week, 4);
        assert_eq!(tier2.target_workload, 3.0);
    }

    #[test]
    fn unknown_field_types_are_rejected() {
        let err = SchedulerConfig::from_toml_str("seed = \"abc\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
