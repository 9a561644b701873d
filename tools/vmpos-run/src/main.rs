use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use env_logger::Builder;

use dslab_vmpos::algorithm::MemeticAlgorithm;
use dslab_vmpos::config::VmposConfig;
use dslab_vmpos::datacenter::Datacenter;
use dslab_vmpos::report::{CsvReporter, LogReporter, Reporters};
use dslab_vmpos::solution::read_base_solution;

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Searches for trade-off VM placements with the memetic algorithm
struct Args {
    /// Path to datacenter description (YAML or plain-text format)
    #[arg(short, long)]
    datacenter: String,

    /// Path to configuration file (YAML or plain-text format), defaults are used if absent
    #[arg(short, long)]
    config: Option<String>,

    /// Path to base solution used as migration cost reference
    #[arg(short, long)]
    base_solution: Option<String>,

    /// Random seed, overrides the one from configuration
    #[arg(short, long)]
    seed: Option<u64>,

    /// Path to produced CSV file with per-generation report
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Path to produced CSV file with Pareto archive
    #[arg(short, long)]
    archive: Option<PathBuf>,

    /// Path to produced JSON file with run summary
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn path_str(path: &Path) -> anyhow::Result<&str> {
    path.to_str()
        .with_context(|| format!("Path {} is not valid UTF-8", path.display()))
}

fn main() -> anyhow::Result<()> {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();

    let datacenter = Datacenter::from_file(&args.datacenter)?;
    let mut config = match &args.config {
        Some(path) => VmposConfig::from_file(path)?,
        None => VmposConfig::new(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let base_solution = match &args.base_solution {
        Some(path) => Some(read_base_solution(path, &datacenter)?),
        None => None,
    };

    let mut algorithm = MemeticAlgorithm::new(datacenter, config, base_solution)?;
    let mut log_reporter = LogReporter::new();
    let mut csv_reporter = CsvReporter::new();
    let summary = {
        let mut reporters = Reporters::new();
        reporters.add(&mut log_reporter);
        reporters.add(&mut csv_reporter);
        algorithm.run(&mut reporters)
    };

    if let Some(path) = &args.report {
        csv_reporter.save(path_str(path)?)?;
        log::info!("Generation report saved to {}", path.display());
    }
    if let Some(path) = &args.archive {
        algorithm.archive().save_csv(path_str(path)?)?;
        log::info!("Pareto archive saved to {}", path.display());
    }
    if let Some(path) = &args.summary {
        std::fs::File::create(path)
            .with_context(|| format!("Can't create {}", path.display()))?
            .write_all(serde_json::to_string_pretty(&summary)?.as_bytes())?;
        log::info!("Run summary saved to {}", path.display());
    } else {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
