//! Memetic algorithm: the generational loop combining evolutionary variation with repair and
//! local search, and collecting non-dominated solutions in the Pareto archive.

use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::Serialize;

use crate::config::VmposConfig;
use crate::datacenter::Datacenter;
use crate::error::Result;
use crate::initialization::{random_assignment, random_population};
use crate::local_search::local_search;
use crate::objectives::{ObjectiveEvaluator, Objectives};
use crate::pareto::{BestSolution, GlobalBest, ObjectiveWeights, ParetoArchive};
use crate::placement::Placement;
use crate::power_model::LinearPowerModel;
use crate::problem::Problem;
use crate::repair::{repair_population, RepairOutcome};
use crate::solution::used_host_count;
use crate::sorting::non_dominated_sort;
use crate::variation::{make_offspring, survivor_selection, Individual, VariationParams};

/// Repair statistics of one processed population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairStats {
    /// individuals made feasible by repair
    pub repaired: usize,
    /// individuals left infeasible after repair
    pub residual: usize,
}

impl RepairStats {
    fn from_outcomes(outcomes: &[RepairOutcome]) -> Self {
        let mut stats = Self::default();
        for outcome in outcomes {
            match outcome {
                RepairOutcome::Feasible => {}
                RepairOutcome::Repaired => stats.repaired += 1,
                RepairOutcome::Residual { .. } => stats.residual += 1,
            }
        }
        stats
    }
}

/// State of the run after a generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub generation: usize,
    /// global best solution
    pub best: Option<BestSolution>,
    /// number of hosts used by the global best solution
    pub hosts_used: usize,
    /// generations since the global best last changed
    pub stagnation: usize,
    pub archive_size: usize,
    pub repair: RepairStats,
}

/// Final results of the run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generations: usize,
    pub best: Option<BestSolution>,
    pub hosts_used: usize,
    pub stagnation: usize,
    pub archive_size: usize,
    pub config: VmposConfig,
}

/// Callbacks invoked during the run.
pub trait RunCallbacks {
    /// Runs before the first generation is reported.
    fn on_start(&mut self, _problem: &Problem, _config: &VmposConfig) {}

    /// Runs after each generation, including the initial one.
    fn on_generation(&mut self, _report: &GenerationReport) {}

    /// Runs upon the completion of the run.
    fn on_finish(&mut self, _summary: &RunSummary) {}
}

/// Callbacks which do nothing.
#[derive(Default)]
pub struct NoCallbacks {}

impl RunCallbacks for NoCallbacks {}

/// Multi-objective memetic optimizer of VM placement.
pub struct MemeticAlgorithm {
    config: VmposConfig,
    problem: Problem,
    evaluator: ObjectiveEvaluator,
    weights: ObjectiveWeights,
    rng: Pcg64,
    parents: Vec<Individual>,
    ranks: Vec<usize>,
    archive: ParetoArchive,
    global_best: GlobalBest,
    generation: usize,
    repair_stats: RepairStats,
}

impl MemeticAlgorithm {
    /// Creates the optimizer and processes the initial population (generation 0).
    ///
    /// If no base solution is given, an extra random assignment over all hosts is drawn after the
    /// initial population and used as the base solution. Otherwise the initial population is drawn
    /// over the hosts used by the base solution.
    pub fn new(datacenter: Datacenter, config: VmposConfig, base_solution: Option<Vec<u32>>) -> Result<Self> {
        config.validate()?;
        let mut rng = Pcg64::seed_from_u64(config.seed);
        let host_count = datacenter.host_count();
        let (base_solution, initial) = match base_solution {
            Some(base) => (base, None),
            None => {
                let initial = random_population(config.individual_count, &datacenter, host_count, &mut rng);
                let base = random_assignment(&datacenter, host_count, &mut rng);
                (base, Some(initial))
            }
        };

        let problem = Problem::new(
            datacenter,
            config.commitment_levels(),
            config.migration_costs(),
            base_solution,
        )?;
        let initial = match initial {
            Some(initial) => initial,
            None => random_population(
                config.individual_count,
                problem.datacenter(),
                problem.base_host_limit(),
                &mut rng,
            ),
        };
        log::debug!(
            "Base solution uses {} of {} hosts",
            problem.base_host_limit(),
            problem.datacenter().host_count()
        );

        let mut algorithm = Self {
            evaluator: ObjectiveEvaluator::new(Box::new(LinearPowerModel::new_with_idle_ratio(
                config.idle_power_ratio,
            ))),
            weights: config.objective_weights(),
            config,
            problem,
            rng,
            parents: Vec::new(),
            ranks: Vec::new(),
            archive: ParetoArchive::new(),
            global_best: GlobalBest::new(),
            generation: 0,
            repair_stats: RepairStats::default(),
        };
        let (parents, ranks) = algorithm.process(initial);
        algorithm.parents = parents;
        algorithm.ranks = ranks;
        algorithm.update_best();
        Ok(algorithm)
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn config(&self) -> &VmposConfig {
        &self.config
    }

    pub fn archive(&self) -> &ParetoArchive {
        &self.archive
    }

    pub fn global_best(&self) -> &GlobalBest {
        &self.global_best
    }

    /// Current parent population.
    pub fn population(&self) -> &[Individual] {
        &self.parents
    }

    /// Number of the last processed generation.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Runs all remaining generations.
    pub fn run(&mut self, callbacks: &mut dyn RunCallbacks) -> RunSummary {
        callbacks.on_start(&self.problem, &self.config);
        callbacks.on_generation(&self.report());
        while self.generation < self.config.generation_count {
            let report = self.step();
            callbacks.on_generation(&report);
        }
        let summary = self.summary();
        callbacks.on_finish(&summary);
        summary
    }

    /// Runs one generation: builds offspring, repairs and improves it, updates the archive and
    /// replaces the parent population with the survivors.
    pub fn step(&mut self) -> GenerationReport {
        self.generation += 1;
        let params = VariationParams {
            offspring_count: self.config.individual_count,
            selection_percent: self.config.selection_percent,
            mutation_probability: self.config.mutation_probability,
            host_limit: self.problem.base_host_limit(),
        };
        let offspring = make_offspring(
            &self.parents,
            &self.ranks,
            self.problem.datacenter(),
            &params,
            &mut self.rng,
        );
        let (offspring, _) = self.process(offspring);

        let parents = std::mem::take(&mut self.parents);
        self.parents = survivor_selection(parents, offspring, self.config.individual_count);
        self.ranks = non_dominated_sort(&self.population_objectives());

        self.update_best();
        let report = self.report();
        log::debug!(
            "Generation {}: archive size {}, repaired {}, residual {}, stagnation {}",
            report.generation,
            report.archive_size,
            report.repair.repaired,
            report.repair.residual,
            report.stagnation
        );
        report
    }

    /// Repairs, improves and evaluates assignments, and adds the non-dominated ones to the archive.
    /// Returns evaluated individuals with their ranks.
    fn process(&mut self, assignments: Vec<Vec<u32>>) -> (Vec<Individual>, Vec<usize>) {
        let host_limit = self.problem.base_host_limit();
        let mut placements = assignments
            .into_iter()
            .map(|assignment| Placement::new(assignment, &self.problem, host_limit))
            .collect::<Vec<_>>();

        let outcomes = repair_population(&mut placements, &self.problem, &mut self.rng);
        self.repair_stats = RepairStats::from_outcomes(&outcomes);
        local_search(&mut placements, &self.problem);

        let objectives = self.evaluator.evaluate_population(&placements, &self.problem);
        let ranks = non_dominated_sort(&objectives);
        for (placement, (objectives, &rank)) in placements.iter().zip(objectives.iter().zip(ranks.iter())) {
            if rank == 1 {
                self.archive.insert(placement.assignment(), *objectives);
            }
        }

        let individuals = placements
            .into_iter()
            .zip(objectives)
            .map(|(placement, objectives)| Individual::new(placement, objectives))
            .collect();
        (individuals, ranks)
    }

    fn update_best(&mut self) {
        if self.global_best.update(&self.archive, &self.weights, self.generation) {
            if let Some(best) = self.global_best.best() {
                log::info!(
                    "Generation {}: new best solution with score {:.4} (energy {:.3}, dispersion {:.3}, migration cost {:.3})",
                    self.generation,
                    best.score,
                    best.entry.objectives.energy,
                    best.entry.objectives.dispersion,
                    best.entry.objectives.migration_cost
                );
            }
        }
    }

    fn best_hosts_used(&self) -> usize {
        self.global_best
            .best()
            .map(|best| used_host_count(&best.entry.assignment))
            .unwrap_or(0)
    }

    /// Builds report of the last processed generation.
    pub fn report(&self) -> GenerationReport {
        GenerationReport {
            generation: self.generation,
            best: self.global_best.best().cloned(),
            hosts_used: self.best_hosts_used(),
            stagnation: self.global_best.stagnation(),
            archive_size: self.archive.len(),
            repair: self.repair_stats,
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            generations: self.generation,
            best: self.global_best.best().cloned(),
            hosts_used: self.best_hosts_used(),
            stagnation: self.global_best.stagnation(),
            archive_size: self.archive.len(),
            config: self.config.clone(),
        }
    }

    /// Objective values of the current parent population.
    pub fn population_objectives(&self) -> Vec<Objectives> {
        self.parents.iter().map(|individual| individual.objectives).collect()
    }
}
