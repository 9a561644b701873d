//! Physical hosts and virtual machines of the datacenter.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VmposError};

/// Physical host (physical machine) with fixed resource capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub cpu: u32,
    pub memory: u64,
    pub storage: u64,
    /// Power consumption when the CPU is fully loaded.
    pub peak_power: f64,
}

impl Host {
    pub fn new(cpu: u32, memory: u64, storage: u64, peak_power: f64) -> Self {
        Self {
            cpu,
            memory,
            storage,
            peak_power,
        }
    }
}

/// Virtual machine with its resource demand.
///
/// Critical VMs must always be placed and their hosts are never oversubscribed beyond the
/// commitment level configured for critical services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vm {
    pub cpu: u32,
    pub memory: u64,
    pub storage: u64,
    #[serde(default)]
    pub critical: bool,
}

impl Vm {
    pub fn new(cpu: u32, memory: u64, storage: u64, critical: bool) -> Self {
        Self {
            cpu,
            memory,
            storage,
            critical,
        }
    }
}

/// Immutable host and VM tables shared by the whole optimization run.
#[derive(Debug, Clone)]
pub struct Datacenter {
    hosts: Vec<Host>,
    vms: Vec<Vm>,
    critical_vm_count: usize,
}

impl Datacenter {
    /// Creates datacenter from host and VM tables, rejecting tables the optimizer can't work with.
    pub fn new(hosts: Vec<Host>, vms: Vec<Vm>) -> Result<Self> {
        if hosts.is_empty() {
            return Err(VmposError::InvalidDatacenter("no physical hosts".to_string()));
        }
        if hosts.len() >= u32::MAX as usize {
            return Err(VmposError::InvalidDatacenter(format!("too many hosts: {}", hosts.len())));
        }
        for (id, host) in hosts.iter().enumerate() {
            if host.cpu == 0 || host.memory == 0 {
                return Err(VmposError::InvalidDatacenter(format!(
                    "host {} has zero CPU or memory capacity",
                    id
                )));
            }
            if !(host.peak_power >= 0.) {
                return Err(VmposError::InvalidDatacenter(format!(
                    "host {} has invalid peak power {}",
                    id, host.peak_power
                )));
            }
        }
        let total_memory = vms.iter().try_fold(0u64, |total, vm| total.checked_add(vm.memory));
        let total_storage = vms.iter().try_fold(0u64, |total, vm| total.checked_add(vm.storage));
        if total_memory.is_none() || total_storage.is_none() {
            return Err(VmposError::InvalidDatacenter(
                "total memory or storage demand of VMs exceeds u64 range".to_string(),
            ));
        }
        let critical_vm_count = vms.iter().filter(|vm| vm.critical).count();
        Ok(Self {
            hosts,
            vms,
            critical_vm_count,
        })
    }

    /// Loads datacenter description, choosing the format by file extension:
    /// `.yaml`/`.yml` files are parsed as YAML, everything else as the plain-text block format.
    pub fn from_file(path: &str) -> Result<Self> {
        match Path::new(path).extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(path),
            _ => Self::from_vmp(path),
        }
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn vms(&self) -> &[Vm] {
        &self.vms
    }

    pub fn host(&self, id: usize) -> &Host {
        &self.hosts[id]
    }

    pub fn vm(&self, id: usize) -> &Vm {
        &self.vms[id]
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn vm_count(&self) -> usize {
        self.vms.len()
    }

    pub fn critical_vm_count(&self) -> usize {
        self.critical_vm_count
    }

    pub fn non_critical_vm_count(&self) -> usize {
        self.vms.len() - self.critical_vm_count
    }
}
