mod common;

use rand::SeedableRng;
use rand_pcg::Pcg64;

use dslab_vmpos::datacenter::{Datacenter, Host, Vm};
use dslab_vmpos::initialization::random_population;
use dslab_vmpos::local_search::{consolidate, drain_underloaded_hosts, improve, local_search, place_unplaced};
use dslab_vmpos::placement::Placement;
use dslab_vmpos::repair::repair_population;

use common::{full_placement, problem_on_first_host};

fn hosts(count: usize, capacity: u32) -> Vec<Host> {
    (0..count)
        .map(|_| Host::new(capacity, capacity as u64, capacity as u64, 200.))
        .collect()
}

#[test]
fn test_unplaced_vms_join_active_hosts() {
    let dc = Datacenter::new(hosts(2, 10), vec![Vm::new(3, 3, 1, false); 3]).unwrap();
    let problem = problem_on_first_host(dc);
    let mut placement = Placement::new(vec![1, 0, 0], &problem, 1);
    place_unplaced(&mut placement, &problem);
    assert_eq!(placement.assignment(), &[1, 1, 1]);
    assert_eq!(placement.host_limit(), 1);
    assert!(placement.is_consistent(&problem));
}

#[test]
fn test_unplaced_vm_powers_on_new_host() {
    let dc = Datacenter::new(hosts(3, 10), vec![Vm::new(8, 8, 1, false); 2]).unwrap();
    let problem = problem_on_first_host(dc);
    let mut placement = Placement::new(vec![1, 0], &problem, 1);
    place_unplaced(&mut placement, &problem);
    assert_eq!(placement.assignment(), &[1, 2]);
    assert_eq!(placement.host_limit(), 2);
    assert!(placement.is_consistent(&problem));
}

#[test]
fn test_unplaced_vm_stays_unplaced_without_free_hosts() {
    let dc = Datacenter::new(hosts(1, 10), vec![Vm::new(8, 8, 1, false); 2]).unwrap();
    let problem = problem_on_first_host(dc);
    let mut placement = Placement::new(vec![1, 0], &problem, 1);
    place_unplaced(&mut placement, &problem);
    assert_eq!(placement.assignment(), &[1, 0]);
    assert_eq!(placement.host_limit(), 1);
}

#[test]
fn test_consolidate_non_critical() {
    let dc = Datacenter::new(
        hosts(3, 10),
        vec![Vm::new(3, 3, 1, false), Vm::new(3, 3, 1, false), Vm::new(2, 2, 1, true)],
    )
    .unwrap();
    let problem = problem_on_first_host(dc);
    let mut placement = full_placement(vec![1, 2, 3], &problem);
    consolidate(&mut placement, &problem, false);
    // the critical VM stays where it is
    assert_eq!(placement.assignment(), &[1, 1, 3]);
    assert!(placement.is_consistent(&problem));
}

#[test]
fn test_consolidate_non_critical_uses_scaled_capacity() {
    let dc = Datacenter::new(hosts(2, 10), vec![Vm::new(6, 6, 1, false), Vm::new(5, 5, 1, false)]).unwrap();
    let problem = problem_on_first_host(dc);
    let mut placement = full_placement(vec![1, 2], &problem);
    consolidate(&mut placement, &problem, false);
    // 11 CPU units fit into 10 * 1.2
    assert_eq!(placement.assignment(), &[1, 1]);
}

#[test]
fn test_consolidate_critical_uses_raw_capacity() {
    let dc = Datacenter::new(hosts(2, 10), vec![Vm::new(6, 6, 1, true), Vm::new(5, 5, 1, true)]).unwrap();
    let problem = problem_on_first_host(dc);
    let mut placement = full_placement(vec![1, 2], &problem);
    consolidate(&mut placement, &problem, true);
    assert_eq!(placement.assignment(), &[1, 2]);

    let dc = Datacenter::new(hosts(2, 10), vec![Vm::new(5, 5, 1, true), Vm::new(5, 5, 1, true)]).unwrap();
    let problem = problem_on_first_host(dc);
    let mut placement = full_placement(vec![1, 2], &problem);
    consolidate(&mut placement, &problem, true);
    assert_eq!(placement.assignment(), &[1, 1]);
    assert!(placement.is_consistent(&problem));
}

#[test]
fn test_drain_underloaded_host() {
    let dc = Datacenter::new(
        hosts(3, 100),
        vec![Vm::new(50, 50, 1, false), Vm::new(3, 3, 1, false), Vm::new(2, 2, 1, false)],
    )
    .unwrap();
    let problem = problem_on_first_host(dc);
    let mut placement = full_placement(vec![1, 2, 2], &problem);
    drain_underloaded_hosts(&mut placement, &problem);
    assert_eq!(placement.assignment(), &[1, 1, 1]);
    assert!(placement.usage(1).is_empty());
    assert!(placement.is_consistent(&problem));
}

#[test]
fn test_drain_respects_commitment_level() {
    let dc = Datacenter::new(
        hosts(2, 100),
        vec![Vm::new(50, 50, 1, true), Vm::new(5, 5, 1, false)],
    )
    .unwrap();
    let problem = problem_on_first_host(dc);
    // the only other active host is critical, so the non-critical VM can't go there
    let mut placement = full_placement(vec![1, 2], &problem);
    drain_underloaded_hosts(&mut placement, &problem);
    assert_eq!(placement.assignment(), &[1, 2]);

    let dc = Datacenter::new(
        hosts(2, 100),
        vec![Vm::new(50, 50, 1, true), Vm::new(5, 5, 1, true)],
    )
    .unwrap();
    let problem = problem_on_first_host(dc);
    let mut placement = full_placement(vec![1, 2], &problem);
    drain_underloaded_hosts(&mut placement, &problem);
    assert_eq!(placement.assignment(), &[1, 1]);
}

#[test]
fn test_drain_keeps_vm_without_target() {
    let dc = Datacenter::new(
        hosts(3, 100),
        vec![Vm::new(50, 50, 1, false), Vm::new(5, 5, 1, true), Vm::new(3, 3, 1, false)],
    )
    .unwrap();
    let problem = problem_on_first_host(dc);
    // no other critical host exists for VM 1, VM 2 still leaves the underloaded host
    let mut placement = full_placement(vec![1, 3, 3], &problem);
    drain_underloaded_hosts(&mut placement, &problem);
    assert_eq!(placement.assignment(), &[1, 3, 1]);
    assert_eq!(placement.usage(2).cpu, 5);
    assert!(placement.is_consistent(&problem));
}

#[test]
fn test_drain_skips_hosts_above_threshold() {
    let dc = Datacenter::new(hosts(2, 100), vec![Vm::new(50, 50, 1, false), Vm::new(11, 11, 1, false)]).unwrap();
    let problem = problem_on_first_host(dc);
    let mut placement = full_placement(vec![1, 2], &problem);
    drain_underloaded_hosts(&mut placement, &problem);
    assert_eq!(placement.assignment(), &[1, 2]);
}

#[test]
fn test_improve_consolidates_placement() {
    let dc = Datacenter::new(
        hosts(4, 10),
        vec![
            Vm::new(2, 2, 1, true),
            Vm::new(2, 2, 1, false),
            Vm::new(2, 2, 1, true),
            Vm::new(2, 2, 1, false),
        ],
    )
    .unwrap();
    let problem = problem_on_first_host(dc);
    let mut placement = full_placement(vec![1, 2, 3, 0], &problem);
    improve(&mut placement, &problem);
    assert!(placement.is_consistent(&problem));
    assert!(placement.assignment().iter().all(|&entry| entry != 0));
    assert_eq!(placement.used_host_count(), 2);
}

#[test]
fn test_local_search_keeps_state_consistent() {
    let dc = Datacenter::from_file("test-configs/datacenter.yaml").unwrap();
    let problem = problem_on_first_host(dc);
    let mut rng = Pcg64::seed_from_u64(7);
    let host_count = problem.datacenter().host_count();
    let mut population = random_population(20, problem.datacenter(), 3, &mut rng)
        .into_iter()
        .map(|assignment| Placement::new(assignment, &problem, 3))
        .collect::<Vec<_>>();
    repair_population(&mut population, &problem, &mut rng);
    local_search(&mut population, &problem);
    for placement in population.iter() {
        assert!(placement.is_consistent(&problem));
        assert!(placement.unplaced_critical_vms(&problem).is_empty());
        assert!(placement.host_limit() <= host_count);
    }
}
