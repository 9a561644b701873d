mod common;

use dslab_vmpos::commitment::CommitmentLevel;
use dslab_vmpos::datacenter::{Datacenter, Host, Vm};
use dslab_vmpos::error::VmposError;
use dslab_vmpos::placement::{Capacity, Placement};
use dslab_vmpos::utilization::{compute_population_utilization, compute_utilization, ResourceUsage};

use common::{full_placement, problem_on_first_host, small_datacenter};

fn usage(cpu: u64, memory: u64, storage: u64) -> ResourceUsage {
    ResourceUsage { cpu, memory, storage }
}

#[test]
fn test_compute_utilization() {
    let dc = small_datacenter();
    assert_eq!(compute_utilization(&[1, 1, 2], &dc), vec![usage(7, 7, 2), usage(3, 3, 1)]);
    assert_eq!(compute_utilization(&[0, 0, 0], &dc), vec![usage(0, 0, 0), usage(0, 0, 0)]);

    let population = vec![vec![1, 1, 1], vec![2, 0, 2]];
    let utilization = compute_population_utilization(&population, &dc);
    assert_eq!(utilization[0], vec![usage(10, 10, 3), usage(0, 0, 0)]);
    assert_eq!(utilization[1], vec![usage(0, 0, 0), usage(7, 7, 2)]);
}

#[test]
fn test_new_placement() {
    let problem = problem_on_first_host(small_datacenter());
    let placement = full_placement(vec![1, 2, 0], &problem);
    assert_eq!(placement.host_of(0), Some(0));
    assert_eq!(placement.host_of(1), Some(1));
    assert_eq!(placement.host_of(2), None);
    assert_eq!(placement.commitment(0), CommitmentLevel::Critical);
    assert_eq!(placement.commitment(1), CommitmentLevel::NonCritical);
    assert_eq!(placement.usage(0), &usage(4, 4, 1));
    assert_eq!(placement.usage(1), &usage(3, 3, 1));
    assert_eq!(placement.used_host_count(), 2);
    assert!(placement.is_consistent(&problem));
}

#[test]
fn test_move_keeps_derived_state_consistent() {
    let problem = problem_on_first_host(small_datacenter());
    let mut placement = full_placement(vec![1, 1, 1], &problem);

    placement.move_vm(0, Some(1), &problem);
    assert!(placement.is_consistent(&problem));
    assert_eq!(placement.assignment(), &[2, 1, 1]);
    assert_eq!(placement.commitment(0), CommitmentLevel::NonCritical);
    assert_eq!(placement.commitment(1), CommitmentLevel::Critical);
    assert_eq!(placement.usage(0), &usage(6, 6, 2));
    assert_eq!(placement.usage(1), &usage(4, 4, 1));

    placement.unassign(1, &problem);
    placement.unassign(2, &problem);
    assert!(placement.is_consistent(&problem));
    assert_eq!(placement.assignment(), &[2, 0, 0]);
    assert_eq!(placement.commitment(0), CommitmentLevel::Unused);
    assert!(placement.usage(0).is_empty());

    placement.move_vm(2, Some(1), &problem);
    assert!(placement.is_consistent(&problem));
    assert_eq!(placement.usage(1), &usage(7, 7, 2));
}

#[test]
fn test_host_limit() {
    let problem = problem_on_first_host(small_datacenter());
    assert_eq!(Placement::new(vec![1, 1, 1], &problem, 5).host_limit(), 2);

    let mut placement = Placement::new(vec![1, 1, 1], &problem, 0);
    assert_eq!(placement.host_limit(), 1);
    assert!(placement.raise_host_limit(2));
    assert_eq!(placement.host_limit(), 2);
    assert!(!placement.raise_host_limit(2));
    assert_eq!(placement.host_limit(), 2);
}

#[test]
fn test_critical_host_is_not_oversubscribed() {
    let problem = problem_on_first_host(small_datacenter());
    // 10 CPU units on a host with capacity 10 and critical level 1.0
    let placement = full_placement(vec![1, 1, 1], &problem);
    assert!(!placement.is_overloaded(0, &problem));
    assert!(placement.is_feasible(&problem));

    let dc = Datacenter::new(
        vec![Host::new(10, 10, 10, 200.), Host::new(10, 10, 10, 200.)],
        vec![Vm::new(4, 4, 1, true), Vm::new(3, 3, 1, false), Vm::new(5, 5, 1, false)],
    )
    .unwrap();
    let problem = problem_on_first_host(dc);
    let placement = full_placement(vec![1, 1, 1], &problem);
    assert!(placement.is_overloaded(0, &problem));
    assert!(!placement.is_feasible(&problem));
    assert_eq!(placement.overloaded_hosts(&problem), vec![0]);

    // without the critical VM the same load fits into the oversubscribed host
    let placement = full_placement(vec![2, 1, 1], &problem);
    assert!(!placement.is_overloaded(0, &problem));
    assert!(placement.is_feasible(&problem));
}

#[test]
fn test_storage_is_not_oversubscribed() {
    let dc = Datacenter::new(
        vec![Host::new(10, 10, 10, 200.)],
        vec![Vm::new(1, 1, 6, false), Vm::new(1, 1, 5, false)],
    )
    .unwrap();
    let problem = problem_on_first_host(dc);
    let placement = full_placement(vec![1, 1], &problem);
    assert!(placement.is_overloaded(0, &problem));

    let placement = full_placement(vec![1, 0], &problem);
    assert!(!placement.fits(1, 0, Capacity::Scaled, &problem));
}

#[test]
fn test_fits_scaled_and_raw() {
    let dc = Datacenter::new(
        vec![Host::new(10, 10, 10, 200.), Host::new(10, 10, 10, 200.)],
        vec![Vm::new(6, 6, 1, false), Vm::new(5, 5, 1, false)],
    )
    .unwrap();
    let problem = problem_on_first_host(dc);
    let placement = full_placement(vec![1, 0], &problem);
    // 11 <= 10 * 1.2
    assert!(placement.fits(1, 0, Capacity::Scaled, &problem));
    assert!(!placement.fits(1, 0, Capacity::Raw, &problem));
    // unused host offers its raw capacity
    assert!(placement.fits(1, 1, Capacity::Scaled, &problem));
}

#[test]
fn test_unplaced_critical_vms() {
    let problem = problem_on_first_host(small_datacenter());
    let placement = full_placement(vec![0, 1, 1], &problem);
    assert_eq!(placement.unplaced_critical_vms(&problem), vec![0]);
    assert!(!placement.is_feasible(&problem));
}

#[test]
fn test_large_cpu_demands_are_summed_without_overflow() {
    let dc = Datacenter::new(
        vec![Host::new(u32::MAX, 10, 10, 200.)],
        vec![Vm::new(3_000_000_000, 1, 1, false), Vm::new(3_000_000_000, 1, 1, false)],
    )
    .unwrap();
    let problem = problem_on_first_host(dc);
    let mut placement = full_placement(vec![1, 1], &problem);
    assert_eq!(placement.usage(0), &usage(6_000_000_000, 2, 2));
    // 6e9 > 4294967295 * 1.2
    assert!(placement.is_overloaded(0, &problem));
    assert!(placement.is_consistent(&problem));

    placement.unassign(1, &problem);
    assert_eq!(placement.usage(0), &usage(3_000_000_000, 1, 1));
    assert!(!placement.is_overloaded(0, &problem));
    assert!(placement.is_consistent(&problem));
}

#[test]
fn test_total_demand_overflow_is_rejected() {
    let result = Datacenter::new(
        vec![Host::new(10, 10, 10, 200.)],
        vec![Vm::new(1, u64::MAX, 1, false), Vm::new(1, 1, 1, false)],
    );
    assert!(matches!(result, Err(VmposError::InvalidDatacenter(_))));
}
