//! Callbacks recording the progress of an optimization run.

use serde::Serialize;

use crate::algorithm::{GenerationReport, RunCallbacks, RunSummary};
use crate::config::VmposConfig;
use crate::error::{Result, VmposError};
use crate::problem::Problem;

/// Logs run progress: the configuration at start, each change of the global best and the final result.
#[derive(Default)]
pub struct LogReporter {
    last_best_generation: Option<usize>,
}

impl LogReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunCallbacks for LogReporter {
    fn on_start(&mut self, problem: &Problem, config: &VmposConfig) {
        let datacenter = problem.datacenter();
        log::info!(
            "Optimizing placement of {} VMs ({} critical) on {} hosts: {} individuals, {} generations",
            datacenter.vm_count(),
            datacenter.critical_vm_count(),
            datacenter.host_count(),
            config.individual_count,
            config.generation_count
        );
        log::info!(
            "Commitment levels: critical {}, non-critical {}; base solution uses {} hosts",
            config.commitment_critical,
            config.commitment_non_critical,
            problem.base_host_limit()
        );
    }

    fn on_generation(&mut self, report: &GenerationReport) {
        if let Some(best) = &report.best {
            if self.last_best_generation != Some(best.generation) {
                self.last_best_generation = Some(best.generation);
                log::info!(
                    "[{}] best: energy {:.3}, dispersion {:.3}, migration cost {:.3}, {} hosts",
                    report.generation,
                    best.entry.objectives.energy,
                    best.entry.objectives.dispersion,
                    best.entry.objectives.migration_cost,
                    report.hosts_used
                );
            }
        }
        if report.repair.residual > 0 {
            log::debug!(
                "[{}] {} individuals remain infeasible after repair",
                report.generation,
                report.repair.residual
            );
        }
    }

    fn on_finish(&mut self, summary: &RunSummary) {
        match &summary.best {
            Some(best) => log::info!(
                "Finished after {} generations: best found in generation {} with score {:.4}, {} hosts used, \
                 {} generations without improvement, {} solutions archived",
                summary.generations,
                best.generation,
                best.score,
                summary.hosts_used,
                summary.stagnation,
                summary.archive_size
            ),
            None => log::warn!("Finished after {} generations without a solution", summary.generations),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ReportRow {
    generation: usize,
    energy: Option<f64>,
    dispersion: Option<f64>,
    migration_cost: Option<f64>,
    score: Option<f64>,
    hosts_used: usize,
    stagnation: usize,
    archive_size: usize,
    repaired: usize,
    residual: usize,
}

/// Collects one row per generation and saves them as CSV.
#[derive(Default)]
pub struct CsvReporter {
    rows: Vec<ReportRow>,
}

impl CsvReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded generations.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush().map_err(|source| VmposError::Io {
            path: path.to_string(),
            source,
        })?;
        Ok(())
    }
}

impl RunCallbacks for CsvReporter {
    fn on_generation(&mut self, report: &GenerationReport) {
        let objectives = report.best.as_ref().map(|best| best.entry.objectives);
        self.rows.push(ReportRow {
            generation: report.generation,
            energy: objectives.map(|o| o.energy),
            dispersion: objectives.map(|o| o.dispersion),
            migration_cost: objectives.map(|o| o.migration_cost),
            score: report.best.as_ref().map(|best| best.score),
            hosts_used: report.hosts_used,
            stagnation: report.stagnation,
            archive_size: report.archive_size,
            repaired: report.repair.repaired,
            residual: report.repair.residual,
        });
    }
}

/// Forwards callbacks to several reporters in order.
#[derive(Default)]
pub struct Reporters<'a> {
    reporters: Vec<&'a mut dyn RunCallbacks>,
}

impl<'a> Reporters<'a> {
    pub fn new() -> Self {
        Self { reporters: Vec::new() }
    }

    pub fn add(&mut self, reporter: &'a mut dyn RunCallbacks) {
        self.reporters.push(reporter);
    }
}

impl<'a> RunCallbacks for Reporters<'a> {
    fn on_start(&mut self, problem: &Problem, config: &VmposConfig) {
        for reporter in self.reporters.iter_mut() {
            reporter.on_start(problem, config);
        }
    }

    fn on_generation(&mut self, report: &GenerationReport) {
        for reporter in self.reporters.iter_mut() {
            reporter.on_generation(report);
        }
    }

    fn on_finish(&mut self, summary: &RunSummary) {
        for reporter in self.reporters.iter_mut() {
            reporter.on_finish(summary);
        }
    }
}
