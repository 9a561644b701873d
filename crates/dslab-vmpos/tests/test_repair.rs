mod common;

use rand::SeedableRng;
use rand_pcg::Pcg64;

use dslab_vmpos::datacenter::{Datacenter, Host, Vm};
use dslab_vmpos::initialization::random_population;
use dslab_vmpos::placement::Placement;
use dslab_vmpos::repair::{needs_repair, repair_individual, repair_population, RepairOutcome, RoundRobin};

use common::{full_placement, problem_on_first_host, small_datacenter};

#[test]
fn test_round_robin() {
    assert_eq!(RoundRobin::new(2, 4).collect::<Vec<_>>(), vec![2, 3, 0, 1]);
    assert_eq!(RoundRobin::new(0, 3).collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(RoundRobin::new(5, 3).collect::<Vec<_>>(), vec![2, 0, 1]);
    assert_eq!(RoundRobin::new(0, 0).count(), 0);
    assert_eq!(RoundRobin::new(1, 4).len(), 4);

    let mut rng = Pcg64::seed_from_u64(123);
    for _ in 0..20 {
        let mut visited = RoundRobin::random(7, &mut rng).collect::<Vec<_>>();
        visited.sort();
        assert_eq!(visited, (0..7).collect::<Vec<_>>());
    }
}

#[test]
fn test_feasible_placement_is_untouched() {
    let problem = problem_on_first_host(small_datacenter());
    let mut rng = Pcg64::seed_from_u64(123);
    // all VMs on one host: 10 CPU units, exactly the capacity of a critical host
    let mut placement = full_placement(vec![1, 1, 1], &problem);
    assert!(!needs_repair(&placement, &problem));
    assert_eq!(repair_individual(&mut placement, &problem, &mut rng), RepairOutcome::Feasible);
    assert_eq!(placement.assignment(), &[1, 1, 1]);
}

#[test]
fn test_relocation_from_overloaded_critical_host() {
    let dc = Datacenter::new(
        vec![Host::new(10, 10, 10, 200.), Host::new(10, 10, 10, 200.)],
        vec![Vm::new(4, 4, 1, true), Vm::new(3, 3, 1, false), Vm::new(5, 5, 1, false)],
    )
    .unwrap();
    let problem = problem_on_first_host(dc);
    for seed in 0..10 {
        let mut rng = Pcg64::seed_from_u64(seed);
        let mut placement = full_placement(vec![1, 1, 1], &problem);
        assert!(needs_repair(&placement, &problem));
        let outcome = repair_individual(&mut placement, &problem, &mut rng);
        assert_eq!(outcome, RepairOutcome::Repaired);
        assert!(placement.is_feasible(&problem));
        assert!(placement.is_consistent(&problem));
        assert!(placement.host_of(0).is_some());
        // the critical VM leaves, the non-critical ones fit into the oversubscribed host
        assert_eq!(placement.assignment(), &[2, 1, 1]);
    }
}

#[test]
fn test_relocation_of_non_critical_vm() {
    let dc = Datacenter::new(
        vec![Host::new(10, 10, 10, 200.), Host::new(10, 10, 10, 200.)],
        vec![Vm::new(4, 4, 1, false), Vm::new(7, 7, 1, false), Vm::new(2, 2, 1, true)],
    )
    .unwrap();
    let problem = problem_on_first_host(dc);
    let mut rng = Pcg64::seed_from_u64(123);
    // host 1 runs a critical VM, so only 10 CPU units are admitted
    let mut placement = full_placement(vec![2, 2, 2], &problem);
    let outcome = repair_individual(&mut placement, &problem, &mut rng);
    assert_eq!(outcome, RepairOutcome::Repaired);
    assert_eq!(placement.assignment(), &[1, 2, 2]);
    assert!(placement.is_consistent(&problem));
}

#[test]
fn test_storage_overload_is_repaired() {
    let dc = Datacenter::new(
        vec![Host::new(10, 10, 10, 200.), Host::new(10, 10, 10, 200.)],
        vec![Vm::new(1, 1, 6, false), Vm::new(1, 1, 6, false)],
    )
    .unwrap();
    let problem = problem_on_first_host(dc);
    let mut rng = Pcg64::seed_from_u64(123);
    let mut placement = full_placement(vec![1, 1], &problem);
    assert_eq!(repair_individual(&mut placement, &problem, &mut rng), RepairOutcome::Repaired);
    assert_eq!(placement.assignment(), &[2, 1]);
}

#[test]
fn test_non_critical_vm_is_evicted_when_nothing_fits() {
    let dc = Datacenter::new(
        vec![Host::new(10, 10, 10, 200.)],
        vec![Vm::new(8, 8, 1, true), Vm::new(5, 5, 1, false)],
    )
    .unwrap();
    let problem = problem_on_first_host(dc);
    let mut rng = Pcg64::seed_from_u64(123);
    let mut placement = full_placement(vec![1, 1], &problem);
    assert_eq!(repair_individual(&mut placement, &problem, &mut rng), RepairOutcome::Repaired);
    assert_eq!(placement.assignment(), &[1, 0]);
    assert!(placement.is_consistent(&problem));
}

#[test]
fn test_non_critical_vm_is_unplaced_when_nothing_fits() {
    let dc = Datacenter::new(
        vec![Host::new(10, 10, 10, 200.)],
        vec![Vm::new(8, 8, 1, false), Vm::new(5, 5, 1, false)],
    )
    .unwrap();
    let problem = problem_on_first_host(dc);
    let mut rng = Pcg64::seed_from_u64(123);
    let mut placement = full_placement(vec![1, 1], &problem);
    assert_eq!(repair_individual(&mut placement, &problem, &mut rng), RepairOutcome::Repaired);
    // the first scanned VM of the overloaded host is dropped
    assert_eq!(placement.assignment(), &[0, 1]);
}

#[test]
fn test_residual_overload_is_reported() {
    let dc = Datacenter::new(
        vec![Host::new(10, 10, 10, 200.)],
        vec![Vm::new(6, 6, 1, true), Vm::new(6, 6, 1, true)],
    )
    .unwrap();
    let problem = problem_on_first_host(dc);
    let mut rng = Pcg64::seed_from_u64(123);
    let mut placement = full_placement(vec![1, 1], &problem);
    let outcome = repair_individual(&mut placement, &problem, &mut rng);
    assert_eq!(
        outcome,
        RepairOutcome::Residual {
            overloaded_hosts: vec![0],
            unplaced_critical_vms: vec![],
        }
    );
    assert!(!outcome.is_feasible());
    // critical VMs are never unplaced
    assert_eq!(placement.assignment(), &[1, 1]);
}

#[test]
fn test_probing_is_limited_to_active_hosts() {
    let dc = Datacenter::new(
        vec![Host::new(10, 10, 10, 200.), Host::new(10, 10, 10, 200.)],
        vec![Vm::new(8, 8, 1, false), Vm::new(5, 5, 1, false)],
    )
    .unwrap();
    let problem = problem_on_first_host(dc);
    let mut rng = Pcg64::seed_from_u64(123);
    let mut placement = Placement::new(vec![1, 1], &problem, 1);
    repair_individual(&mut placement, &problem, &mut rng);
    assert_eq!(placement.assignment(), &[0, 1]);

    let mut placement = Placement::new(vec![1, 1], &problem, 2);
    repair_individual(&mut placement, &problem, &mut rng);
    assert_eq!(placement.assignment(), &[2, 1]);
}

#[test]
fn test_repair_population() {
    let dc = Datacenter::from_file("test-configs/datacenter.yaml").unwrap();
    let problem = problem_on_first_host(dc);
    let mut rng = Pcg64::seed_from_u64(123);
    let host_count = problem.datacenter().host_count();
    let mut population = random_population(30, problem.datacenter(), host_count, &mut rng)
        .into_iter()
        .map(|assignment| Placement::new(assignment, &problem, host_count))
        .collect::<Vec<_>>();
    let outcomes = repair_population(&mut population, &problem, &mut rng);
    assert_eq!(outcomes.len(), 30);
    for (placement, outcome) in population.iter().zip(outcomes.iter()) {
        assert!(placement.is_consistent(&problem));
        assert!(placement.unplaced_critical_vms(&problem).is_empty());
        assert_eq!(outcome.is_feasible(), placement.is_feasible(&problem));
    }
}
