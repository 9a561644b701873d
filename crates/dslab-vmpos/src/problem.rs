//! Immutable problem instance shared by all stages of the optimization.

use crate::commitment::CommitmentLevels;
use crate::datacenter::Datacenter;
use crate::error::Result;
use crate::objectives::MigrationCosts;
use crate::solution::{used_host_count, validate_assignment};

/// Host and VM tables together with the scalar parameters and the base solution.
#[derive(Debug, Clone)]
pub struct Problem {
    datacenter: Datacenter,
    levels: CommitmentLevels,
    migration_costs: MigrationCosts,
    base_solution: Vec<u32>,
    base_host_limit: usize,
}

impl Problem {
    /// Creates problem instance.
    ///
    /// The number of hosts used by the base solution becomes the initial active host limit of
    /// every individual.
    pub fn new(
        datacenter: Datacenter,
        levels: CommitmentLevels,
        migration_costs: MigrationCosts,
        base_solution: Vec<u32>,
    ) -> Result<Self> {
        validate_assignment(&base_solution, &datacenter)?;
        let base_host_limit = used_host_count(&base_solution).clamp(1, datacenter.host_count());
        Ok(Self {
            datacenter,
            levels,
            migration_costs,
            base_solution,
            base_host_limit,
        })
    }

    pub fn datacenter(&self) -> &Datacenter {
        &self.datacenter
    }

    pub fn levels(&self) -> &CommitmentLevels {
        &self.levels
    }

    pub fn migration_costs(&self) -> &MigrationCosts {
        &self.migration_costs
    }

    pub fn base_solution(&self) -> &[u32] {
        &self.base_solution
    }

    /// Initial active host limit of individuals.
    pub fn base_host_limit(&self) -> usize {
        self.base_host_limit
    }
}
