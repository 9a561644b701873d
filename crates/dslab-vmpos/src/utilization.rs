//! Resource utilization of physical hosts.

use serde::Serialize;

use crate::datacenter::{Datacenter, Vm};
use crate::solution::host_of;

/// Resources currently consumed on a host by the VMs assigned to it.
///
/// CPU usage is kept in `u64` so that any set of VMs stacked on one host sums without overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResourceUsage {
    pub cpu: u64,
    pub memory: u64,
    pub storage: u64,
}

impl ResourceUsage {
    /// Adds VM demand to the usage.
    pub fn add(&mut self, vm: &Vm) {
        self.cpu += vm.cpu as u64;
        self.memory += vm.memory;
        self.storage += vm.storage;
    }

    /// Removes VM demand from the usage.
    pub fn remove(&mut self, vm: &Vm) {
        self.cpu -= vm.cpu as u64;
        self.memory -= vm.memory;
        self.storage -= vm.storage;
    }

    pub fn is_empty(&self) -> bool {
        self.cpu == 0 && self.memory == 0 && self.storage == 0
    }
}

/// Computes per-host utilization of one individual by summing the demands of assigned VMs.
pub fn compute_utilization(assignment: &[u32], datacenter: &Datacenter) -> Vec<ResourceUsage> {
    let mut usage = vec![ResourceUsage::default(); datacenter.host_count()];
    for (vm_id, &entry) in assignment.iter().enumerate() {
        if let Some(host) = host_of(entry) {
            usage[host].add(datacenter.vm(vm_id));
        }
    }
    usage
}

/// Computes utilization matrix of the whole population.
pub fn compute_population_utilization(population: &[Vec<u32>], datacenter: &Datacenter) -> Vec<Vec<ResourceUsage>> {
    population
        .iter()
        .map(|assignment| compute_utilization(assignment, datacenter))
        .collect()
}
