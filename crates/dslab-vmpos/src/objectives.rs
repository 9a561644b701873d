//! Objectives minimized by the optimizer: energy consumption, dispersion and migration cost.

use serde::{Deserialize, Serialize};

use crate::datacenter::Datacenter;
use crate::placement::Placement;
use crate::power_model::{LinearPowerModel, PowerModel};
use crate::problem::Problem;

/// Objective values of one placement, all minimized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Objectives {
    pub energy: f64,
    pub dispersion: f64,
    pub migration_cost: f64,
}

impl Objectives {
    pub const COUNT: usize = 3;

    pub fn new(energy: f64, dispersion: f64, migration_cost: f64) -> Self {
        Self {
            energy,
            dispersion,
            migration_cost,
        }
    }

    pub fn as_array(&self) -> [f64; Self::COUNT] {
        [self.energy, self.dispersion, self.migration_cost]
    }

    /// Checks whether these objective values dominate the other ones: no worse in every objective
    /// and strictly better in at least one.
    pub fn dominates(&self, other: &Objectives) -> bool {
        let a = self.as_array();
        let b = other.as_array();
        a.iter().zip(b.iter()).all(|(x, y)| x <= y) && a.iter().zip(b.iter()).any(|(x, y)| x < y)
    }
}

/// Costs of moving a VM away from the host it occupies in the base solution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MigrationCosts {
    pub critical: f64,
    pub non_critical: f64,
}

impl MigrationCosts {
    pub fn new(critical: f64, non_critical: f64) -> Self {
        Self { critical, non_critical }
    }
}

/// Computes migration cost of the assignment relative to the base solution: every VM whose entry
/// differs from the base solution is charged the cost of its class.
pub fn migration_cost(base: &[u32], assignment: &[u32], datacenter: &Datacenter, costs: &MigrationCosts) -> f64 {
    base.iter()
        .zip(assignment.iter())
        .enumerate()
        .filter(|(_, (before, after))| before != after)
        .map(|(vm_id, _)| {
            if datacenter.vm(vm_id).critical {
                costs.critical
            } else {
                costs.non_critical
            }
        })
        .sum()
}

/// Computes objective values of placements.
#[derive(Clone)]
pub struct ObjectiveEvaluator {
    power_model: Box<dyn PowerModel>,
}

impl ObjectiveEvaluator {
    pub fn new(power_model: Box<dyn PowerModel>) -> Self {
        Self { power_model }
    }

    pub fn evaluate(&self, placement: &Placement, problem: &Problem) -> Objectives {
        Objectives {
            energy: self.energy(placement, problem),
            dispersion: dispersion(placement, problem.datacenter()),
            migration_cost: migration_cost(
                problem.base_solution(),
                placement.assignment(),
                problem.datacenter(),
                problem.migration_costs(),
            ),
        }
    }

    pub fn evaluate_population(&self, population: &[Placement], problem: &Problem) -> Vec<Objectives> {
        population
            .iter()
            .map(|placement| self.evaluate(placement, problem))
            .collect()
    }

    /// Total power of active hosts, where host CPU load is measured against the capacity admitted by
    /// its commitment level.
    pub fn energy(&self, placement: &Placement, problem: &Problem) -> f64 {
        let datacenter = problem.datacenter();
        let mut energy = 0.;
        for (host_id, host) in datacenter.hosts().iter().enumerate() {
            let used = placement.usage(host_id).cpu;
            if used == 0 {
                continue;
            }
            let capacity = host.cpu as f64 * problem.levels().factor(placement.commitment(host_id));
            energy += self.power_model.get_power(host.peak_power, used as f64 / capacity);
        }
        energy
    }
}

impl Default for ObjectiveEvaluator {
    fn default() -> Self {
        Self::new(Box::new(LinearPowerModel::new()))
    }
}

/// Dispersion level of the placement: how many active hosts the critical and non-critical VMs are
/// spread over, relative to their counts.
pub fn dispersion(placement: &Placement, datacenter: &Datacenter) -> f64 {
    let host_count = datacenter.host_count();
    let mut has_critical = vec![false; host_count];
    let mut has_non_critical = vec![false; host_count];
    for vm_id in 0..datacenter.vm_count() {
        if let Some(host) = placement.host_of(vm_id) {
            if datacenter.vm(vm_id).critical {
                has_critical[host] = true;
            } else {
                has_non_critical[host] = true;
            }
        }
    }
    let mut critical_hosts = 0;
    let mut non_critical_hosts = 0;
    for host in 0..host_count {
        if placement.usage(host).cpu == 0 {
            continue;
        }
        if has_critical[host] {
            critical_hosts += 1;
        }
        if has_non_critical[host] {
            non_critical_hosts += 1;
        }
    }

    let critical_vms = datacenter.critical_vm_count() as f64;
    let non_critical_vms = datacenter.non_critical_vm_count() as f64;
    let cs = critical_hosts as f64;
    let ncs = non_critical_hosts as f64;
    match (critical_hosts, non_critical_hosts) {
        (0, 0) => 0.,
        (0, _) => non_critical_vms / ncs,
        (_, 0) => critical_vms / cs,
        _ => cs / (critical_vms / cs + non_critical_vms / ncs),
    }
}
