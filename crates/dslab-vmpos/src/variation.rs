//! Evolutionary operators: parent selection, crossover, mutation and survivor selection.
//!
//! Operators work on assignment vectors only. Commitment, utilization and objectives of new
//! individuals are derived later, when the vectors are turned into placements.

use rand::Rng;
use rand_pcg::Pcg64;

use crate::datacenter::Datacenter;
use crate::initialization::random_assignment;
use crate::objectives::Objectives;
use crate::placement::Placement;
use crate::sorting::{crowding_distance, fronts, non_dominated_sort};

/// Evaluated member of a population.
#[derive(Debug, Clone)]
pub struct Individual {
    pub placement: Placement,
    pub objectives: Objectives,
}

impl Individual {
    pub fn new(placement: Placement, objectives: Objectives) -> Self {
        Self { placement, objectives }
    }
}

/// Returns indices of individuals whose rank belongs to the best `percent` share of ranks.
fn selection_pool(ranks: &[usize], percent: f64) -> Vec<usize> {
    let max_rank = ranks.iter().copied().max().unwrap_or(1);
    let threshold = ((max_rank as f64 * percent).ceil() as usize).max(1);
    (0..ranks.len()).filter(|&i| ranks[i] <= threshold).collect()
}

/// Selects one individual uniformly among those within the best `percent` share of ranks.
pub fn select_parent(ranks: &[usize], percent: f64, rng: &mut Pcg64) -> usize {
    let pool = selection_pool(ranks, percent);
    pool[rng.gen_range(0..pool.len())]
}

/// Selects two distinct parents, drawing the second one again while it equals the first.
///
/// If the pool of best ranks holds a single individual, the second parent is taken from the rest
/// of the population.
pub fn select_parents(ranks: &[usize], percent: f64, rng: &mut Pcg64) -> (usize, usize) {
    assert!(ranks.len() >= 2, "at least two individuals are needed to select parents");
    let pool = selection_pool(ranks, percent);
    let first = pool[rng.gen_range(0..pool.len())];
    if pool.len() < 2 {
        let mut second = rng.gen_range(0..ranks.len() - 1);
        if second >= first {
            second += 1;
        }
        return (first, second);
    }
    loop {
        let second = pool[rng.gen_range(0..pool.len())];
        if second != first {
            return (first, second);
        }
    }
}

/// Single-point crossover: the child takes the genes of the first parent before a random split point
/// and the genes of the second parent after it.
pub fn crossover(first: &[u32], second: &[u32], rng: &mut Pcg64) -> Vec<u32> {
    assert_eq!(first.len(), second.len());
    if first.len() < 2 {
        return first.to_vec();
    }
    let point = rng.gen_range(1..first.len());
    first[..point].iter().chain(second[point..].iter()).copied().collect()
}

/// Reassigns each VM to a random host with the given probability. Critical VMs never become unplaced.
pub fn mutate(assignment: &mut [u32], datacenter: &Datacenter, probability: f64, rng: &mut Pcg64) {
    let host_count = datacenter.host_count() as u32;
    for (vm_id, entry) in assignment.iter_mut().enumerate() {
        if !rng.gen_bool(probability) {
            continue;
        }
        *entry = if datacenter.vm(vm_id).critical {
            rng.gen_range(1..=host_count)
        } else {
            rng.gen_range(0..=host_count)
        };
    }
}

/// Parameters of offspring generation.
#[derive(Debug, Clone, Copy)]
pub struct VariationParams {
    pub offspring_count: usize,
    pub selection_percent: f64,
    pub mutation_probability: f64,
    /// Host limit of the random offspring.
    pub host_limit: usize,
}

/// Builds offspring assignments from the ranked parent population.
///
/// The first offspring is the crossover child of two selected parents, the others are random
/// assignments. All offspring are mutated.
pub fn make_offspring(
    parents: &[Individual],
    ranks: &[usize],
    datacenter: &Datacenter,
    params: &VariationParams,
    rng: &mut Pcg64,
) -> Vec<Vec<u32>> {
    let mut offspring = Vec::with_capacity(params.offspring_count);
    if params.offspring_count > 0 {
        let (father, mother) = select_parents(ranks, params.selection_percent, rng);
        log::trace!("Selected parents {} and {}", father, mother);
        offspring.push(crossover(
            parents[father].placement.assignment(),
            parents[mother].placement.assignment(),
            rng,
        ));
    }
    while offspring.len() < params.offspring_count {
        offspring.push(random_assignment(datacenter, params.host_limit, rng));
    }
    for assignment in offspring.iter_mut() {
        mutate(assignment, datacenter, params.mutation_probability, rng);
    }
    offspring
}

/// Merges parents and offspring and keeps `count` best individuals by front rank, preferring less
/// crowded individuals inside the last admitted front.
pub fn survivor_selection(parents: Vec<Individual>, offspring: Vec<Individual>, count: usize) -> Vec<Individual> {
    let mut merged = parents.into_iter().chain(offspring).map(Some).collect::<Vec<_>>();
    let objectives = merged
        .iter()
        .flatten()
        .map(|individual| individual.objectives)
        .collect::<Vec<_>>();
    let ranks = non_dominated_sort(&objectives);

    let mut selected = Vec::with_capacity(count);
    for front in fronts(&ranks) {
        if selected.len() >= count {
            break;
        }
        if selected.len() + front.len() <= count {
            selected.extend(front);
            continue;
        }
        let distance = crowding_distance(&objectives, &front);
        let mut order = (0..front.len()).collect::<Vec<_>>();
        order.sort_by(|&a, &b| distance[b].total_cmp(&distance[a]));
        let missing = count - selected.len();
        selected.extend(order.into_iter().take(missing).map(|i| front[i]));
    }

    selected
        .into_iter()
        .filter_map(|i| merged[i].take())
        .collect()
}
