#![allow(dead_code)]

use dslab_vmpos::commitment::CommitmentLevels;
use dslab_vmpos::datacenter::{Datacenter, Host, Vm};
use dslab_vmpos::objectives::MigrationCosts;
use dslab_vmpos::placement::Placement;
use dslab_vmpos::problem::Problem;

pub fn name_wrapper(file_name: &str) -> String {
    format!("test-configs/{}", file_name)
}

/// Two hosts with 10 units of each resource, one critical VM (4, 4, 1) and two non-critical VMs (3, 3, 1).
pub fn small_datacenter() -> Datacenter {
    Datacenter::new(
        vec![Host::new(10, 10, 10, 200.), Host::new(10, 10, 10, 200.)],
        vec![
            Vm::new(4, 4, 1, true),
            Vm::new(3, 3, 1, false),
            Vm::new(3, 3, 1, false),
        ],
    )
    .unwrap()
}

/// Creates problem with critical level 1.0, non-critical level 1.2 and unit migration costs.
pub fn make_problem(datacenter: Datacenter, base_solution: Vec<u32>) -> Problem {
    Problem::new(
        datacenter,
        CommitmentLevels::new(1.0, 1.2),
        MigrationCosts::new(1., 1.),
        base_solution,
    )
    .unwrap()
}

/// Creates problem with base solution placing every VM on the first host.
pub fn problem_on_first_host(datacenter: Datacenter) -> Problem {
    let base = vec![1; datacenter.vm_count()];
    make_problem(datacenter, base)
}

/// Creates placement which may use all hosts of the problem.
pub fn full_placement(assignment: Vec<u32>, problem: &Problem) -> Placement {
    let host_count = problem.datacenter().host_count();
    Placement::new(assignment, problem, host_count)
}
