//! Commitment levels of physical hosts.
//!
//! A commitment level scales the CPU and memory capacity a host may offer to its VMs. Hosts running
//! at least one critical VM get the critical level (usually without oversubscription), hosts running
//! only non-critical VMs get the non-critical level (usually above 1, i.e. oversubscribed), unused
//! hosts have zero commitment. Storage is never scaled.

use serde::Serialize;

use crate::datacenter::Datacenter;
use crate::solution::host_of;

/// Commitment level of a host within one individual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommitmentLevel {
    Unused,
    NonCritical,
    Critical,
}

/// Numeric values of commitment levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CommitmentLevels {
    pub critical: f64,
    pub non_critical: f64,
}

impl CommitmentLevels {
    pub fn new(critical: f64, non_critical: f64) -> Self {
        Self { critical, non_critical }
    }

    /// Returns the capacity multiplier of the level.
    pub fn factor(&self, level: CommitmentLevel) -> f64 {
        match level {
            CommitmentLevel::Unused => 0.,
            CommitmentLevel::NonCritical => self.non_critical,
            CommitmentLevel::Critical => self.critical,
        }
    }
}

/// Recomputes commitment row of one individual in place.
///
/// Critical VMs always win: a host is critical as soon as it runs one critical VM, independently of
/// the order in which VMs are visited.
pub fn update_commitment(assignment: &[u32], datacenter: &Datacenter, commitment: &mut [CommitmentLevel]) {
    commitment.fill(CommitmentLevel::Unused);
    for (vm_id, &entry) in assignment.iter().enumerate() {
        if let Some(host) = host_of(entry) {
            if datacenter.vm(vm_id).critical {
                commitment[host] = CommitmentLevel::Critical;
            } else if commitment[host] != CommitmentLevel::Critical {
                commitment[host] = CommitmentLevel::NonCritical;
            }
        }
    }
}

/// Computes commitment row of one individual.
pub fn compute_commitment(assignment: &[u32], datacenter: &Datacenter) -> Vec<CommitmentLevel> {
    let mut commitment = vec![CommitmentLevel::Unused; datacenter.host_count()];
    update_commitment(assignment, datacenter, &mut commitment);
    commitment
}

/// Computes commitment matrix of the whole population.
pub fn compute_population_commitment(population: &[Vec<u32>], datacenter: &Datacenter) -> Vec<Vec<CommitmentLevel>> {
    population
        .iter()
        .map(|assignment| compute_commitment(assignment, datacenter))
        .collect()
}

/// Returns the commitment level `host` would have if `vm` were moved onto it.
pub fn level_after_move(assignment: &[u32], datacenter: &Datacenter, vm: usize, host: usize) -> CommitmentLevel {
    if datacenter.vm(vm).critical {
        return CommitmentLevel::Critical;
    }
    let mut level = CommitmentLevel::NonCritical;
    for (vm_id, &entry) in assignment.iter().enumerate() {
        if vm_id != vm && host_of(entry) == Some(host) && datacenter.vm(vm_id).critical {
            level = CommitmentLevel::Critical;
            break;
        }
    }
    level
}

/// Checks whether moving `vm` onto `host` keeps the host commitment at least at its current value,
/// i.e. the move doesn't lower the capacity the host offers to the VMs already running there.
pub fn admits_move(
    assignment: &[u32],
    commitment: &[CommitmentLevel],
    datacenter: &Datacenter,
    levels: &CommitmentLevels,
    vm: usize,
    host: usize,
) -> bool {
    let after = level_after_move(assignment, datacenter, vm, host);
    levels.factor(after) >= levels.factor(commitment[host])
}
