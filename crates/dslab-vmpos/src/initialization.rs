//! Random generation of initial assignment vectors.

use rand::Rng;
use rand_pcg::Pcg64;

use crate::datacenter::Datacenter;

/// Generates random assignment over the first `host_limit` hosts.
///
/// Non-critical VMs may stay unplaced (entry 0), critical VMs always get a host.
pub fn random_assignment(datacenter: &Datacenter, host_limit: usize, rng: &mut Pcg64) -> Vec<u32> {
    let host_limit = host_limit.clamp(1, datacenter.host_count()) as u32;
    datacenter
        .vms()
        .iter()
        .map(|vm| {
            if vm.critical {
                rng.gen_range(1..=host_limit)
            } else {
                rng.gen_range(0..=host_limit)
            }
        })
        .collect()
}

/// Generates `count` random assignments over the first `host_limit` hosts.
pub fn random_population(count: usize, datacenter: &Datacenter, host_limit: usize, rng: &mut Pcg64) -> Vec<Vec<u32>> {
    (0..count)
        .map(|_| random_assignment(datacenter, host_limit, rng))
        .collect()
}
