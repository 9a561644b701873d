//! Pareto archive collecting non-dominated solutions across generations and choosing the global best.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VmposError};
use crate::objectives::Objectives;
use crate::sorting::non_dominated_sort;

/// Solution stored in the archive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveEntry {
    pub assignment: Vec<u32>,
    pub objectives: Objectives,
}

impl ArchiveEntry {
    pub fn new(assignment: Vec<u32>, objectives: Objectives) -> Self {
        Self { assignment, objectives }
    }
}

/// Removes entries whose assignment repeats an earlier entry, returns the number of removed entries.
pub fn remove_duplicates(entries: &mut Vec<ArchiveEntry>) -> usize {
    let before = entries.len();
    let mut seen = HashSet::new();
    entries.retain(|entry| seen.insert(entry.assignment.clone()));
    before - entries.len()
}

/// Row of the archive CSV file.
#[derive(Debug, Serialize, Deserialize)]
struct ArchiveRecord {
    energy: f64,
    dispersion: f64,
    migration_cost: f64,
    /// space-separated assignment entries
    assignment: String,
}

/// Insertion-ordered collection of solutions without duplicate assignments.
///
/// Entries are never pruned by dominance, only exact duplicates are rejected.
#[derive(Debug, Clone, Default)]
pub struct ParetoArchive {
    entries: IndexMap<Vec<u32>, Objectives>,
}

impl ParetoArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds archive from entry list, dropping duplicates.
    pub fn from_entries(mut entries: Vec<ArchiveEntry>) -> Self {
        let removed = remove_duplicates(&mut entries);
        if removed > 0 {
            log::debug!("Removed {} duplicate archive entries", removed);
        }
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.assignment, entry.objectives))
                .collect(),
        }
    }

    /// Adds a copy of the solution unless the archive already holds the same assignment.
    /// Returns whether the solution was added.
    pub fn insert(&mut self, assignment: &[u32], objectives: Objectives) -> bool {
        if self.entries.contains_key(assignment) {
            return false;
        }
        self.entries.insert(assignment.to_vec(), objectives);
        true
    }

    pub fn contains(&self, assignment: &[u32]) -> bool {
        self.entries.contains_key(assignment)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u32], &Objectives)> {
        self.entries
            .iter()
            .map(|(assignment, objectives)| (assignment.as_slice(), objectives))
    }

    pub fn entries(&self) -> Vec<ArchiveEntry> {
        self.iter()
            .map(|(assignment, objectives)| ArchiveEntry::new(assignment.to_vec(), *objectives))
            .collect()
    }

    pub fn get(&self, index: usize) -> Option<ArchiveEntry> {
        self.entries
            .get_index(index)
            .map(|(assignment, objectives)| ArchiveEntry::new(assignment.clone(), *objectives))
    }

    pub fn objectives(&self) -> Vec<Objectives> {
        self.entries.values().copied().collect()
    }

    /// Saves archive to CSV file.
    pub fn save_csv(&self, path: &str) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for (assignment, objectives) in self.iter() {
            writer.serialize(ArchiveRecord {
                energy: objectives.energy,
                dispersion: objectives.dispersion,
                migration_cost: objectives.migration_cost,
                assignment: assignment
                    .iter()
                    .map(|entry| entry.to_string())
                    .collect::<Vec<_>>()
                    .join(" "),
            })?;
        }
        writer.flush().map_err(|source| VmposError::Io {
            path: path.to_string(),
            source,
        })?;
        Ok(())
    }

    /// Loads archive saved by [`save_csv`](ParetoArchive::save_csv).
    pub fn load_csv(path: &str) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut entries = Vec::new();
        for (i, record) in reader.deserialize::<ArchiveRecord>().enumerate() {
            let record = record?;
            let assignment = record
                .assignment
                .split_whitespace()
                .map(|token| token.parse::<u32>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| VmposError::Parse {
                    path: path.to_string(),
                    line: i + 2,
                    message: format!("can't parse assignment \"{}\"", record.assignment),
                })?;
            entries.push(ArchiveEntry::new(
                assignment,
                Objectives::new(record.energy, record.dispersion, record.migration_cost),
            ));
        }
        Ok(Self::from_entries(entries))
    }
}

/// Weights of objectives used to pick a single solution from the Pareto front.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObjectiveWeights {
    pub energy: f64,
    pub dispersion: f64,
    pub migration: f64,
}

impl ObjectiveWeights {
    pub fn new(energy: f64, dispersion: f64, migration: f64) -> Self {
        Self {
            energy,
            dispersion,
            migration,
        }
    }

    fn as_array(&self) -> [f64; Objectives::COUNT] {
        [self.energy, self.dispersion, self.migration]
    }
}

/// Picks the non-dominated archive entry with the lowest weighted sum of min-max normalized
/// objectives. Returns its index in the archive and its score.
///
/// On equal scores the most recently inserted entry wins.
pub fn select_best(archive: &ParetoArchive, weights: &ObjectiveWeights) -> Option<(usize, f64)> {
    let objectives = archive.objectives();
    let ranks = non_dominated_sort(&objectives);
    let front = (0..objectives.len()).filter(|&i| ranks[i] == 1).collect::<Vec<_>>();
    if front.is_empty() {
        return None;
    }

    let mut min = [f64::INFINITY; Objectives::COUNT];
    let mut max = [f64::NEG_INFINITY; Objectives::COUNT];
    for &i in front.iter() {
        for (k, value) in objectives[i].as_array().into_iter().enumerate() {
            min[k] = min[k].min(value);
            max[k] = max[k].max(value);
        }
    }

    let weights = weights.as_array();
    let score = |i: usize| -> f64 {
        objectives[i]
            .as_array()
            .into_iter()
            .enumerate()
            .map(|(k, value)| {
                let range = max[k] - min[k];
                if range > 0. {
                    weights[k] * (value - min[k]) / range
                } else {
                    0.
                }
            })
            .sum()
    };

    let mut best: Option<(usize, f64)> = None;
    for &i in front.iter().rev() {
        let value = score(i);
        match best {
            Some((_, best_value)) if best_value <= value => {}
            _ => best = Some((i, value)),
        }
    }
    best
}

/// Best solution found so far.
#[derive(Debug, Clone, Serialize)]
pub struct BestSolution {
    pub entry: ArchiveEntry,
    pub score: f64,
    /// generation in which the solution became the best one
    pub generation: usize,
}

/// Tracks the global best solution and the number of generations without improvement.
#[derive(Debug, Clone, Default)]
pub struct GlobalBest {
    best: Option<BestSolution>,
    stagnation: usize,
}

impl GlobalBest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn best(&self) -> Option<&BestSolution> {
        self.best.as_ref()
    }

    /// Number of generations since the last improvement.
    pub fn stagnation(&self) -> usize {
        self.stagnation
    }

    /// Chooses the best archive entry and makes it the global best if its score is strictly lower than
    /// the current one and its assignment differs. Otherwise increases the stagnation counter.
    /// Returns whether the global best has changed.
    pub fn update(&mut self, archive: &ParetoArchive, weights: &ObjectiveWeights, generation: usize) -> bool {
        let candidate = select_best(archive, weights).and_then(|(index, score)| {
            archive.get(index).map(|entry| BestSolution {
                entry,
                score,
                generation,
            })
        });
        let improves = match (&candidate, &self.best) {
            (Some(candidate), Some(current)) => {
                candidate.score < current.score && candidate.entry.assignment != current.entry.assignment
            }
            (Some(_), None) => true,
            (None, _) => false,
        };
        if improves {
            self.best = candidate;
            self.stagnation = 0;
        } else {
            self.stagnation += 1;
        }
        improves
    }
}
