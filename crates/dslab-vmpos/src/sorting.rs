//! Non-dominated sorting and crowding distance over objective vectors.

use crate::objectives::Objectives;

/// Assigns front ranks to objective vectors by fast non-dominated sorting.
///
/// Rank 1 is the non-dominated front, rank 2 is the front which becomes non-dominated after rank 1
/// is removed, and so on.
pub fn non_dominated_sort(objectives: &[Objectives]) -> Vec<usize> {
    let n = objectives.len();
    let mut dominated_by = vec![Vec::new(); n];
    let mut domination_count = vec![0usize; n];
    for i in 0..n {
        for j in i + 1..n {
            if objectives[i].dominates(&objectives[j]) {
                dominated_by[i].push(j);
                domination_count[j] += 1;
            } else if objectives[j].dominates(&objectives[i]) {
                dominated_by[j].push(i);
                domination_count[i] += 1;
            }
        }
    }

    let mut rank = vec![0; n];
    let mut front = (0..n).filter(|&i| domination_count[i] == 0).collect::<Vec<_>>();
    let mut current = 1;
    while !front.is_empty() {
        let mut next = Vec::new();
        for &i in front.iter() {
            rank[i] = current;
            for &j in dominated_by[i].iter() {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    next.push(j);
                }
            }
        }
        front = next;
        current += 1;
    }
    rank
}

/// Groups indices by rank, the first group being rank 1.
pub fn fronts(ranks: &[usize]) -> Vec<Vec<usize>> {
    let max_rank = ranks.iter().copied().max().unwrap_or(0);
    let mut result = vec![Vec::new(); max_rank];
    for (i, &rank) in ranks.iter().enumerate() {
        result[rank - 1].push(i);
    }
    result
}

/// Returns indices of non-dominated objective vectors.
pub fn select_nondominated(objectives: &[Objectives]) -> Vec<usize> {
    non_dominated_sort(objectives)
        .into_iter()
        .enumerate()
        .filter(|&(_, rank)| rank == 1)
        .map(|(i, _)| i)
        .collect()
}

/// Computes crowding distance of every member of a front (given by indices into `objectives`).
///
/// Boundary points of every objective get infinite distance, inner points get the sum of normalized
/// distances between their neighbours.
pub fn crowding_distance(objectives: &[Objectives], front: &[usize]) -> Vec<f64> {
    let mut dist = vec![0f64; front.len()];
    if front.len() <= 2 {
        dist.fill(f64::INFINITY);
        return dist;
    }
    let values = front.iter().map(|&i| objectives[i].as_array()).collect::<Vec<_>>();
    for k in 0..Objectives::COUNT {
        let mut order = (0..front.len()).collect::<Vec<_>>();
        order.sort_by(|&a, &b| values[a][k].total_cmp(&values[b][k]));
        let first = order[0];
        let last = order[order.len() - 1];
        dist[first] = f64::INFINITY;
        dist[last] = f64::INFINITY;
        let range = values[last][k] - values[first][k];
        if range <= 0. {
            continue;
        }
        for i in 1..order.len() - 1 {
            dist[order[i]] += (values[order[i + 1]][k] - values[order[i - 1]][k]) / range;
        }
    }
    dist
}
