//! Feasibility repair of placements.
//!
//! A placement is feasible when every critical VM is placed and no used host exceeds the capacity
//! admitted by its commitment level. Repair relocates VMs away from overloaded hosts and, when no
//! host can take them, drops non-critical VMs. Critical VMs are never unplaced, so repair may give up
//! and leave a residual violation when capacity is insufficient.

use rand::Rng;
use rand_pcg::Pcg64;

use crate::placement::{Capacity, Placement};
use crate::problem::Problem;

/// Result of repairing one placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairOutcome {
    /// Placement was feasible, nothing was changed.
    Feasible,
    /// Placement was infeasible and became feasible.
    Repaired,
    /// Placement is still infeasible after all relocation and eviction options were exhausted.
    Residual {
        overloaded_hosts: Vec<usize>,
        unplaced_critical_vms: Vec<usize>,
    },
}

impl RepairOutcome {
    pub fn is_feasible(&self) -> bool {
        !matches!(self, RepairOutcome::Residual { .. })
    }
}

/// Visits each of `len` slots exactly once, starting from `start` and wrapping around.
#[derive(Debug, Clone)]
pub struct RoundRobin {
    next: usize,
    len: usize,
    remaining: usize,
}

impl RoundRobin {
    pub fn new(start: usize, len: usize) -> Self {
        Self {
            next: if len == 0 { 0 } else { start % len },
            len,
            remaining: len,
        }
    }

    /// Starts from a slot chosen uniformly at random.
    pub fn random(len: usize, rng: &mut Pcg64) -> Self {
        let start = if len == 0 { 0 } else { rng.gen_range(0..len) };
        Self::new(start, len)
    }
}

impl Iterator for RoundRobin {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next;
        self.next = (self.next + 1) % self.len;
        self.remaining -= 1;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for RoundRobin {}

/// Checks whether placement violates capacity or critical placement constraints.
pub fn needs_repair(placement: &Placement, problem: &Problem) -> bool {
    !placement.is_feasible(problem)
}

/// Repairs all infeasible placements of the population.
pub fn repair_population(population: &mut [Placement], problem: &Problem, rng: &mut Pcg64) -> Vec<RepairOutcome> {
    population
        .iter_mut()
        .enumerate()
        .map(|(id, placement)| {
            let outcome = repair_individual(placement, problem, rng);
            if let RepairOutcome::Residual {
                overloaded_hosts,
                unplaced_critical_vms,
            } = &outcome
            {
                log::warn!(
                    "Individual {} remains infeasible after repair: overloaded hosts {:?}, unplaced critical VMs {:?}",
                    id,
                    overloaded_hosts,
                    unplaced_critical_vms
                );
            }
            outcome
        })
        .collect()
}

/// Repairs one placement if it is infeasible.
///
/// VMs are scanned in index order. A VM on an overloaded host is moved to the first host, probed
/// round-robin from a random start over the active host limit, which keeps its commitment level and
/// has enough residual scaled capacity. If there is no such host, the VM is unplaced unless it is
/// critical, and then the remaining non-critical VMs of the overloaded host are evicted one by one
/// until the overload clears.
pub fn repair_individual(placement: &mut Placement, problem: &Problem, rng: &mut Pcg64) -> RepairOutcome {
    if !needs_repair(placement, problem) {
        return RepairOutcome::Feasible;
    }

    let datacenter = problem.datacenter();
    for vm in 0..datacenter.vm_count() {
        let source = match placement.host_of(vm) {
            Some(host) => host,
            None => continue,
        };
        if !placement.is_overloaded(source, problem) {
            continue;
        }

        let target = RoundRobin::random(placement.host_limit(), rng).find(|&candidate| {
            candidate != source
                && placement.admits_move(vm, candidate, problem)
                && placement.fits(vm, candidate, Capacity::Scaled, problem)
        });
        if let Some(target) = target {
            placement.move_vm(vm, Some(target), problem);
            continue;
        }

        if !datacenter.vm(vm).critical {
            placement.unassign(vm, problem);
        }
        if placement.is_overloaded(source, problem) {
            evict_non_critical(placement, source, problem);
        }
    }

    let overloaded_hosts = placement.overloaded_hosts(problem);
    let unplaced_critical_vms = placement.unplaced_critical_vms(problem);
    if overloaded_hosts.is_empty() && unplaced_critical_vms.is_empty() {
        RepairOutcome::Repaired
    } else {
        RepairOutcome::Residual {
            overloaded_hosts,
            unplaced_critical_vms,
        }
    }
}

/// Unplaces non-critical VMs of the host in index order until it is no longer overloaded.
fn evict_non_critical(placement: &mut Placement, host: usize, problem: &Problem) {
    let datacenter = problem.datacenter();
    for vm in 0..datacenter.vm_count() {
        if placement.host_of(vm) != Some(host) || datacenter.vm(vm).critical {
            continue;
        }
        placement.unassign(vm, problem);
        if !placement.is_overloaded(host, problem) {
            break;
        }
    }
}
