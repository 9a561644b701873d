//! Local search improving repaired placements.
//!
//! Every placement goes through four greedy phases: placing the unplaced VMs, consolidating
//! non-critical VMs, consolidating critical VMs and draining hosts with low CPU utilization.
//! Each phase is a single pass in VM (or host) index order.

use crate::commitment::CommitmentLevel;
use crate::placement::{Capacity, Placement};
use crate::problem::Problem;

/// Hosts with CPU usage not above this share of their raw CPU capacity are drained.
pub const LOW_UTILIZATION_THRESHOLD: f64 = 0.1;

/// Applies local search to every placement of the population.
pub fn local_search(population: &mut [Placement], problem: &Problem) {
    for placement in population.iter_mut() {
        improve(placement, problem);
    }
}

/// Applies all local search phases to one placement.
pub fn improve(placement: &mut Placement, problem: &Problem) {
    place_unplaced(placement, problem);
    consolidate(placement, problem, false);
    consolidate(placement, problem, true);
    drain_underloaded_hosts(placement, problem);
}

/// Places every unplaced VM on the host of the first VM (in index order) where it fits with scaled
/// capacity. If it fits nowhere, the active host limit is raised and the VM goes to the first unused
/// host within the limit.
pub fn place_unplaced(placement: &mut Placement, problem: &Problem) {
    let datacenter = problem.datacenter();
    let vm_count = datacenter.vm_count();
    for vm in 0..vm_count {
        if placement.host_of(vm).is_some() {
            continue;
        }
        let target = (0..vm_count)
            .filter_map(|other| placement.host_of(other))
            .find(|&host| placement.fits(vm, host, Capacity::Scaled, problem));
        if let Some(host) = target {
            placement.move_vm(vm, Some(host), problem);
            continue;
        }

        placement.raise_host_limit(datacenter.host_count());
        let unused = (0..placement.host_limit()).find(|&host| placement.commitment(host) == CommitmentLevel::Unused);
        if let Some(host) = unused {
            log::trace!("Powering on host {} for VM {}", host, vm);
            placement.move_vm(vm, Some(host), problem);
        }
    }
}

/// For every placed VM of the given class, pulls the other VMs of the same class onto its host while
/// they fit. Critical VMs are checked against raw capacity, non-critical ones against scaled capacity.
pub fn consolidate(placement: &mut Placement, problem: &Problem, critical: bool) {
    let datacenter = problem.datacenter();
    let vm_count = datacenter.vm_count();
    let capacity = if critical { Capacity::Raw } else { Capacity::Scaled };
    for vm in 0..vm_count {
        if datacenter.vm(vm).critical != critical {
            continue;
        }
        let host = match placement.host_of(vm) {
            Some(host) => host,
            None => continue,
        };
        for other in 0..vm_count {
            if datacenter.vm(other).critical != critical {
                continue;
            }
            match placement.host_of(other) {
                Some(other_host) if other_host != host => {
                    if placement.fits(other, host, capacity, problem) {
                        placement.move_vm(other, Some(host), problem);
                    }
                }
                _ => {}
            }
        }
    }
}

/// Migrates VMs away from hosts whose CPU usage is positive but low.
///
/// Critical VMs may only go to other critical hosts (raw capacity), non-critical VMs only to hosts
/// running non-critical VMs alone (scaled capacity). One pass per host is enough: migrations only
/// fill the targets and never change their level, so a VM left on the host can't move later.
pub fn drain_underloaded_hosts(placement: &mut Placement, problem: &Problem) {
    let datacenter = problem.datacenter();
    for host in 0..placement.host_limit() {
        let used = placement.usage(host).cpu;
        let threshold = datacenter.host(host).cpu as f64 * LOW_UTILIZATION_THRESHOLD;
        if used == 0 || used as f64 > threshold {
            continue;
        }
        for vm in 0..datacenter.vm_count() {
            if placement.host_of(vm) != Some(host) {
                continue;
            }
            let (level, capacity) = if datacenter.vm(vm).critical {
                (CommitmentLevel::Critical, Capacity::Raw)
            } else {
                (CommitmentLevel::NonCritical, Capacity::Scaled)
            };
            let target = (0..placement.host_limit()).find(|&other| {
                other != host && placement.commitment(other) == level && placement.fits(vm, other, capacity, problem)
            });
            if let Some(target) = target {
                placement.move_vm(vm, Some(target), problem);
            }
        }
    }
}
