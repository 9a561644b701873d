use std::str::FromStr;

use crate::config::{VmposConfig, VmposConfigRaw};
use crate::datacenter::{Datacenter, Host, Vm};
use crate::error::{read_file, Result, VmposError};

const HOSTS_HEADER: &str = "PHYSICAL MACHINES";
const VMS_HEADER: &str = "VIRTUAL MACHINES";

const POPULATION_HEADER: &str = "POPULATION";
const WEIGHTS_HEADER: &str = "OBJECTIVES WEIGHT";
const COMMITMENT_HEADER: &str = "COMMITMENT LEVEL";
const MIGRATION_HEADER: &str = "MIGRATION COSTS";

/// Splits a line into `count` whitespace-separated numbers.
fn parse_row<T: FromStr>(path: &str, line_no: usize, line: &str, count: usize) -> Result<Vec<T>> {
    let values = line
        .split_whitespace()
        .map(|token| token.parse::<T>())
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|_| parse_error(path, line_no, format!("can't parse numbers from \"{}\"", line.trim())))?;
    if values.len() != count {
        return Err(parse_error(
            path,
            line_no,
            format!("expected {} values, found {}", count, values.len()),
        ));
    }
    Ok(values)
}

fn parse_error(path: &str, line_no: usize, message: String) -> VmposError {
    VmposError::Parse {
        path: path.to_string(),
        line: line_no,
        message,
    }
}

#[derive(PartialEq)]
enum Block {
    None,
    Hosts,
    Vms,
}

impl Datacenter {
    /// Reads datacenter from a plain-text file with two blocks of rows.
    ///
    /// Rows after the `PHYSICAL MACHINES` header are `cpu memory storage peak_power`, rows after the
    /// `VIRTUAL MACHINES` header are `cpu memory storage critical`, where `critical` is 1 for VMs
    /// running critical services and 0 otherwise. Blank lines are ignored.
    pub fn from_vmp(path: &str) -> Result<Self> {
        let content = read_file(path)?;
        let mut hosts = Vec::new();
        let mut vms = Vec::new();
        let mut block = Block::None;
        for (i, line) in content.lines().enumerate() {
            let line_no = i + 1;
            if line.contains(HOSTS_HEADER) {
                block = Block::Hosts;
                continue;
            }
            if line.contains(VMS_HEADER) {
                block = Block::Vms;
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            match block {
                Block::None => {
                    return Err(parse_error(path, line_no, "data found before any header".to_string()));
                }
                Block::Hosts => {
                    let row = parse_row::<u64>(path, line_no, line, 4)?;
                    let cpu = u32::try_from(row[0])
                        .map_err(|_| parse_error(path, line_no, format!("CPU capacity {} is too large", row[0])))?;
                    hosts.push(Host::new(cpu, row[1], row[2], row[3] as f64));
                }
                Block::Vms => {
                    let row = parse_row::<u64>(path, line_no, line, 4)?;
                    let cpu = u32::try_from(row[0])
                        .map_err(|_| parse_error(path, line_no, format!("CPU demand {} is too large", row[0])))?;
                    let critical = match row[3] {
                        0 => false,
                        1 => true,
                        flag => return Err(parse_error(path, line_no, format!("unknown critical flag {}", flag))),
                    };
                    vms.push(Vm::new(cpu, row[1], row[2], critical));
                }
            }
        }
        Datacenter::new(hosts, vms)
    }
}

#[derive(PartialEq)]
enum ConfigBlock {
    None,
    Population,
    Weights,
    Commitment,
    Migration,
}

impl VmposConfig {
    /// Reads config from a plain-text file with blocks:
    ///
    /// ```text
    /// POPULATION
    /// <individuals> <generations>
    /// OBJECTIVES WEIGHT
    /// <energy> <dispersion> <migration>
    /// COMMITMENT LEVEL
    /// <critical> <non-critical>
    /// MIGRATION COSTS
    /// <critical> <non-critical>
    /// ```
    ///
    /// Absent blocks keep their default values.
    pub fn from_vmp(path: &str) -> Result<Self> {
        let content = read_file(path)?;
        let mut raw = VmposConfigRaw::default();
        let mut block = ConfigBlock::None;
        for (i, line) in content.lines().enumerate() {
            let line_no = i + 1;
            if line.contains(POPULATION_HEADER) {
                block = ConfigBlock::Population;
                continue;
            }
            if line.contains(WEIGHTS_HEADER) {
                block = ConfigBlock::Weights;
                continue;
            }
            if line.contains(COMMITMENT_HEADER) {
                block = ConfigBlock::Commitment;
                continue;
            }
            if line.contains(MIGRATION_HEADER) {
                block = ConfigBlock::Migration;
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            match block {
                ConfigBlock::None => {
                    return Err(parse_error(path, line_no, "data found before any header".to_string()));
                }
                ConfigBlock::Population => {
                    let row = parse_row::<usize>(path, line_no, line, 2)?;
                    raw.individual_count = Some(row[0]);
                    raw.generation_count = Some(row[1]);
                }
                ConfigBlock::Weights => {
                    let row = parse_row::<f64>(path, line_no, line, 3)?;
                    raw.energy_weight = Some(row[0]);
                    raw.dispersion_weight = Some(row[1]);
                    raw.migration_weight = Some(row[2]);
                }
                ConfigBlock::Commitment => {
                    let row = parse_row::<f64>(path, line_no, line, 2)?;
                    raw.commitment_critical = Some(row[0]);
                    raw.commitment_non_critical = Some(row[1]);
                }
                ConfigBlock::Migration => {
                    let row = parse_row::<f64>(path, line_no, line, 2)?;
                    raw.migration_cost_critical = Some(row[0]);
                    raw.migration_cost_non_critical = Some(row[1]);
                }
            }
        }
        VmposConfig::from_raw(raw)
    }
}
