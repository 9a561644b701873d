//! Optimization run configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::commitment::CommitmentLevels;
use crate::error::{read_file, Result, VmposError};
use crate::objectives::MigrationCosts;
use crate::pareto::ObjectiveWeights;

/// Configuration as it appears in YAML file, all fields are optional.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct VmposConfigRaw {
    /// number of individuals in parent and offspring populations
    pub individual_count: Option<usize>,
    /// number of generations to run
    pub generation_count: Option<usize>,
    /// weight of energy consumption when choosing the best solution
    pub energy_weight: Option<f64>,
    /// weight of dispersion level when choosing the best solution
    pub dispersion_weight: Option<f64>,
    /// weight of migration cost when choosing the best solution
    pub migration_weight: Option<f64>,
    /// commitment level of hosts running at least one critical VM
    pub commitment_critical: Option<f64>,
    /// commitment level of hosts running only non-critical VMs
    pub commitment_non_critical: Option<f64>,
    /// cost of moving a critical VM away from its base host
    pub migration_cost_critical: Option<f64>,
    /// cost of moving a non-critical VM away from its base host
    pub migration_cost_non_critical: Option<f64>,
    /// fraction of best ranks parents are selected from
    pub selection_percent: Option<f64>,
    /// per-VM probability of random reassignment in offspring
    pub mutation_probability: Option<f64>,
    /// seed of the random number generator
    pub seed: Option<u64>,
    /// idle power of a host relative to its peak power
    pub idle_power_ratio: Option<f64>,
}

/// Represents optimization run configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VmposConfig {
    /// number of individuals in parent and offspring populations
    pub individual_count: usize,
    /// number of generations to run
    pub generation_count: usize,
    /// weight of energy consumption when choosing the best solution
    pub energy_weight: f64,
    /// weight of dispersion level when choosing the best solution
    pub dispersion_weight: f64,
    /// weight of migration cost when choosing the best solution
    pub migration_weight: f64,
    /// commitment level of hosts running at least one critical VM
    pub commitment_critical: f64,
    /// commitment level of hosts running only non-critical VMs
    pub commitment_non_critical: f64,
    /// cost of moving a critical VM away from its base host
    pub migration_cost_critical: f64,
    /// cost of moving a non-critical VM away from its base host
    pub migration_cost_non_critical: f64,
    /// fraction of best ranks parents are selected from
    pub selection_percent: f64,
    /// per-VM probability of random reassignment in offspring
    pub mutation_probability: f64,
    /// seed of the random number generator
    pub seed: u64,
    /// idle power of a host relative to its peak power
    pub idle_power_ratio: f64,
}

impl Default for VmposConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl VmposConfig {
    /// Creates config with default parameter values.
    pub fn new() -> Self {
        Self {
            individual_count: 100,
            generation_count: 100,
            energy_weight: 1. / 3.,
            dispersion_weight: 1. / 3.,
            migration_weight: 1. / 3.,
            commitment_critical: 1.0,
            commitment_non_critical: 1.2,
            migration_cost_critical: 1.0,
            migration_cost_non_critical: 1.0,
            selection_percent: 0.5,
            mutation_probability: 0.01,
            seed: 123,
            idle_power_ratio: 0.6,
        }
    }

    /// Reads config from file, choosing the format by file extension: `.yaml`/`.yml` files are parsed
    /// as YAML, everything else as the plain-text block format.
    pub fn from_file(path: &str) -> Result<Self> {
        match Path::new(path).extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(path),
            _ => Self::from_vmp(path),
        }
    }

    /// Reads config from YAML file (uses default values if some parameters are absent).
    pub fn from_yaml(path: &str) -> Result<Self> {
        let raw: VmposConfigRaw = serde_yaml::from_str(&read_file(path)?).map_err(|source| VmposError::Yaml {
            path: path.to_string(),
            source,
        })?;
        Self::from_raw(raw)
    }

    /// Merges raw config with default values and validates the result.
    pub fn from_raw(raw: VmposConfigRaw) -> Result<Self> {
        let default = Self::new();
        let config = Self {
            individual_count: raw.individual_count.unwrap_or(default.individual_count),
            generation_count: raw.generation_count.unwrap_or(default.generation_count),
            energy_weight: raw.energy_weight.unwrap_or(default.energy_weight),
            dispersion_weight: raw.dispersion_weight.unwrap_or(default.dispersion_weight),
            migration_weight: raw.migration_weight.unwrap_or(default.migration_weight),
            commitment_critical: raw.commitment_critical.unwrap_or(default.commitment_critical),
            commitment_non_critical: raw.commitment_non_critical.unwrap_or(default.commitment_non_critical),
            migration_cost_critical: raw.migration_cost_critical.unwrap_or(default.migration_cost_critical),
            migration_cost_non_critical: raw
                .migration_cost_non_critical
                .unwrap_or(default.migration_cost_non_critical),
            selection_percent: raw.selection_percent.unwrap_or(default.selection_percent),
            mutation_probability: raw.mutation_probability.unwrap_or(default.mutation_probability),
            seed: raw.seed.unwrap_or(default.seed),
            idle_power_ratio: raw.idle_power_ratio.unwrap_or(default.idle_power_ratio),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that parameter values are usable by the optimizer.
    pub fn validate(&self) -> Result<()> {
        if self.individual_count < 2 {
            return Err(invalid(format!(
                "at least 2 individuals are required, got {}",
                self.individual_count
            )));
        }
        for (name, value) in [
            ("commitment_critical", self.commitment_critical),
            ("commitment_non_critical", self.commitment_non_critical),
        ] {
            if !(value > 0.) || !value.is_finite() {
                return Err(invalid(format!("{} must be positive, got {}", name, value)));
            }
        }
        for (name, value) in [
            ("energy_weight", self.energy_weight),
            ("dispersion_weight", self.dispersion_weight),
            ("migration_weight", self.migration_weight),
            ("migration_cost_critical", self.migration_cost_critical),
            ("migration_cost_non_critical", self.migration_cost_non_critical),
        ] {
            if !(value >= 0.) || !value.is_finite() {
                return Err(invalid(format!("{} must be non-negative, got {}", name, value)));
            }
        }
        if !(self.selection_percent > 0. && self.selection_percent <= 1.) {
            return Err(invalid(format!(
                "selection_percent must be in (0, 1], got {}",
                self.selection_percent
            )));
        }
        if !(0. ..=1.).contains(&self.mutation_probability) {
            return Err(invalid(format!(
                "mutation_probability must be in [0, 1], got {}",
                self.mutation_probability
            )));
        }
        if !(0. ..=1.).contains(&self.idle_power_ratio) {
            return Err(invalid(format!(
                "idle_power_ratio must be in [0, 1], got {}",
                self.idle_power_ratio
            )));
        }
        Ok(())
    }

    pub fn commitment_levels(&self) -> CommitmentLevels {
        CommitmentLevels::new(self.commitment_critical, self.commitment_non_critical)
    }

    pub fn migration_costs(&self) -> MigrationCosts {
        MigrationCosts::new(self.migration_cost_critical, self.migration_cost_non_critical)
    }

    pub fn objective_weights(&self) -> ObjectiveWeights {
        ObjectiveWeights::new(self.energy_weight, self.dispersion_weight, self.migration_weight)
    }
}

fn invalid(message: String) -> VmposError {
    VmposError::InvalidConfig(message)
}
