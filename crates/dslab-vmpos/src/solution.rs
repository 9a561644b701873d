//! Assignment vectors: the representation of a candidate VM placement.
//!
//! Entry `i` of an assignment vector describes VM `i`: zero means the VM is not placed, any other
//! value `h` means that the VM runs on host `h - 1`.

use std::collections::BTreeSet;

use crate::datacenter::Datacenter;
use crate::error::{read_file, Result, VmposError};

/// Assignment vector entry of a VM which is not placed.
pub const UNPLACED: u32 = 0;

/// Returns host index encoded by an assignment entry.
pub fn host_of(entry: u32) -> Option<usize> {
    if entry == UNPLACED {
        None
    } else {
        Some(entry as usize - 1)
    }
}

/// Encodes host index (or its absence) as an assignment entry.
pub fn entry_of(host: Option<usize>) -> u32 {
    match host {
        Some(host) => host as u32 + 1,
        None => UNPLACED,
    }
}

/// Returns the number of distinct hosts used by the assignment.
pub fn used_host_count(assignment: &[u32]) -> usize {
    assignment
        .iter()
        .filter(|&&entry| entry != UNPLACED)
        .collect::<BTreeSet<_>>()
        .len()
}

/// Checks that the assignment matches the datacenter: one entry per VM, every entry refers to an
/// existing host, and every critical VM is placed.
pub fn validate_assignment(assignment: &[u32], datacenter: &Datacenter) -> Result<()> {
    if assignment.len() != datacenter.vm_count() {
        return Err(VmposError::InvalidBaseSolution(format!(
            "expected {} entries, found {}",
            datacenter.vm_count(),
            assignment.len()
        )));
    }
    for (vm_id, &entry) in assignment.iter().enumerate() {
        if entry as usize > datacenter.host_count() {
            return Err(VmposError::InvalidBaseSolution(format!(
                "VM {} is assigned to host {} but there are only {} hosts",
                vm_id,
                entry,
                datacenter.host_count()
            )));
        }
        if entry == UNPLACED && datacenter.vm(vm_id).critical {
            return Err(VmposError::InvalidBaseSolution(format!(
                "critical VM {} is not placed",
                vm_id
            )));
        }
    }
    Ok(())
}

/// Reads base solution from file with whitespace-separated assignment entries, one per VM.
pub fn read_base_solution(path: &str, datacenter: &Datacenter) -> Result<Vec<u32>> {
    let content = read_file(path)?;
    let mut assignment = Vec::with_capacity(datacenter.vm_count());
    for (i, line) in content.lines().enumerate() {
        for token in line.split_whitespace() {
            let entry = token.parse::<u32>().map_err(|_| VmposError::Parse {
                path: path.to_string(),
                line: i + 1,
                message: format!("can't parse host number \"{}\"", token),
            })?;
            assignment.push(entry);
        }
    }
    validate_assignment(&assignment, datacenter)?;
    Ok(assignment)
}
