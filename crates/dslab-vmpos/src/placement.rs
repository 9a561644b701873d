//! Candidate placement together with the state derived from it.

use serde::Serialize;

use crate::commitment::{admits_move, compute_commitment, update_commitment, CommitmentLevel};
use crate::problem::Problem;
use crate::solution::{entry_of, host_of, used_host_count, UNPLACED};
use crate::utilization::{compute_utilization, ResourceUsage};

/// How host capacity is compared with resource demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// Physical capacity of the host.
    Raw,
    /// Capacity multiplied by the host commitment level when it oversubscribes the host (level
    /// above 1), physical capacity otherwise. Storage is never scaled.
    Scaled,
}

/// One individual: an assignment vector and its commitment and utilization rows.
///
/// All mutations go through [`move_vm`](Placement::move_vm), which keeps commitment and
/// utilization equal to what a full recomputation from the assignment would produce.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    assignment: Vec<u32>,
    commitment: Vec<CommitmentLevel>,
    usage: Vec<ResourceUsage>,
    host_limit: usize,
}

impl Placement {
    /// Creates placement from assignment vector, deriving commitment and utilization from scratch.
    pub fn new(assignment: Vec<u32>, problem: &Problem, host_limit: usize) -> Self {
        let datacenter = problem.datacenter();
        assert_eq!(
            assignment.len(),
            datacenter.vm_count(),
            "assignment length doesn't match the number of VMs"
        );
        let commitment = compute_commitment(&assignment, datacenter);
        let usage = compute_utilization(&assignment, datacenter);
        Self {
            assignment,
            commitment,
            usage,
            host_limit: host_limit.clamp(1, datacenter.host_count()),
        }
    }

    pub fn assignment(&self) -> &[u32] {
        &self.assignment
    }

    /// Returns host of the VM, if it is placed.
    pub fn host_of(&self, vm: usize) -> Option<usize> {
        host_of(self.assignment[vm])
    }

    pub fn commitment(&self, host: usize) -> CommitmentLevel {
        self.commitment[host]
    }

    pub fn usage(&self, host: usize) -> &ResourceUsage {
        &self.usage[host]
    }

    /// Number of host slots considered by repair probing and low-utilization draining.
    pub fn host_limit(&self) -> usize {
        self.host_limit
    }

    /// Raises active host limit by one unless it already covers all hosts.
    pub fn raise_host_limit(&mut self, host_count: usize) -> bool {
        if self.host_limit < host_count {
            self.host_limit += 1;
            true
        } else {
            false
        }
    }

    /// Returns the number of hosts running at least one VM.
    pub fn used_host_count(&self) -> usize {
        used_host_count(&self.assignment)
    }

    /// Moves VM to another host (or unplaces it if `host` is `None`), updating utilization and
    /// commitment of the individual together with the assignment.
    pub fn move_vm(&mut self, vm: usize, host: Option<usize>, problem: &Problem) {
        let datacenter = problem.datacenter();
        let demand = datacenter.vm(vm);
        if let Some(source) = self.host_of(vm) {
            self.usage[source].remove(demand);
        }
        if let Some(target) = host {
            self.usage[target].add(demand);
        }
        self.assignment[vm] = entry_of(host);
        update_commitment(&self.assignment, datacenter, &mut self.commitment);
        log::trace!("VM {} moved to {:?}", vm, host);
    }

    /// Unplaces VM, removing its demand from its host.
    pub fn unassign(&mut self, vm: usize, problem: &Problem) {
        self.move_vm(vm, None, problem);
    }

    /// Checks whether the host exceeds its admissible capacity on any resource.
    pub fn is_overloaded(&self, host: usize, problem: &Problem) -> bool {
        let capacity = problem.datacenter().host(host);
        let factor = problem.levels().factor(self.commitment[host]);
        let usage = &self.usage[host];
        usage.cpu as f64 > capacity.cpu as f64 * factor
            || usage.memory as f64 > capacity.memory as f64 * factor
            || usage.storage > capacity.storage
    }

    /// Checks whether VM demand fits into the residual capacity of the host.
    pub fn fits(&self, vm: usize, host: usize, capacity: Capacity, problem: &Problem) -> bool {
        let host_capacity = problem.datacenter().host(host);
        let demand = problem.datacenter().vm(vm);
        let factor = match capacity {
            Capacity::Raw => 1.,
            Capacity::Scaled => problem.levels().factor(self.commitment[host]).max(1.),
        };
        let usage = &self.usage[host];
        (usage.cpu as f64 + demand.cpu as f64) <= host_capacity.cpu as f64 * factor
            && (usage.memory as f64 + demand.memory as f64) <= host_capacity.memory as f64 * factor
            && usage.storage + demand.storage <= host_capacity.storage
    }

    /// Checks whether moving VM onto the host keeps the host commitment level.
    pub fn admits_move(&self, vm: usize, host: usize, problem: &Problem) -> bool {
        admits_move(
            &self.assignment,
            &self.commitment,
            problem.datacenter(),
            problem.levels(),
            vm,
            host,
        )
    }

    /// Returns used hosts which exceed their admissible capacity.
    pub fn overloaded_hosts(&self, problem: &Problem) -> Vec<usize> {
        (0..self.commitment.len())
            .filter(|&host| self.commitment[host] != CommitmentLevel::Unused && self.is_overloaded(host, problem))
            .collect()
    }

    /// Returns critical VMs which are not placed.
    pub fn unplaced_critical_vms(&self, problem: &Problem) -> Vec<usize> {
        let datacenter = problem.datacenter();
        (0..self.assignment.len())
            .filter(|&vm| self.assignment[vm] == UNPLACED && datacenter.vm(vm).critical)
            .collect()
    }

    /// Checks placement constraints: every critical VM is placed and no used host is overloaded.
    pub fn is_feasible(&self, problem: &Problem) -> bool {
        let datacenter = problem.datacenter();
        let critical_placed = self
            .assignment
            .iter()
            .enumerate()
            .all(|(vm, &entry)| entry != UNPLACED || !datacenter.vm(vm).critical);
        critical_placed
            && (0..self.commitment.len())
                .all(|host| self.commitment[host] == CommitmentLevel::Unused || !self.is_overloaded(host, problem))
    }

    /// Checks that commitment and utilization rows match a full recomputation from the assignment.
    pub fn is_consistent(&self, problem: &Problem) -> bool {
        let datacenter = problem.datacenter();
        self.commitment == compute_commitment(&self.assignment, datacenter)
            && self.usage == compute_utilization(&self.assignment, datacenter)
    }
}
