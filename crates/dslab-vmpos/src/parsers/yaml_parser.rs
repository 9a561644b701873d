use serde::{Deserialize, Serialize};

use crate::datacenter::{Datacenter, Host, Vm};
use crate::error::{read_file, Result, VmposError};

fn one() -> u32 {
    1
}

#[derive(Debug, Serialize, Deserialize)]
struct YamlHost {
    cpu: u32,
    memory: u64,
    storage: u64,
    peak_power: f64,
    /// number of identical hosts
    #[serde(default = "one")]
    count: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct YamlVm {
    cpu: u32,
    memory: u64,
    storage: u64,
    #[serde(default)]
    critical: bool,
    /// number of identical VMs
    #[serde(default = "one")]
    count: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Yaml {
    hosts: Vec<YamlHost>,
    #[serde(default = "Vec::new")]
    vms: Vec<YamlVm>,
}

impl Datacenter {
    /// Reads datacenter from YAML file with `hosts` and `vms` lists.
    ///
    /// Each list item may carry `count` to describe several identical machines at once.
    pub fn from_yaml(path: &str) -> Result<Self> {
        let yaml: Yaml = serde_yaml::from_str(&read_file(path)?).map_err(|source| VmposError::Yaml {
            path: path.to_string(),
            source,
        })?;
        let mut hosts = Vec::new();
        for host in yaml.hosts.iter() {
            for _ in 0..host.count {
                hosts.push(Host::new(host.cpu, host.memory, host.storage, host.peak_power));
            }
        }
        let mut vms = Vec::new();
        for vm in yaml.vms.iter() {
            for _ in 0..vm.count {
                vms.push(Vm::new(vm.cpu, vm.memory, vm.storage, vm.critical));
            }
        }
        Datacenter::new(hosts, vms)
    }
}
