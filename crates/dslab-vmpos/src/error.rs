//! Errors reported while loading problem descriptions and configuration.

use thiserror::Error;

/// Errors of the loading side: malformed files and inconsistent tables are rejected here,
/// before the optimization starts. The optimization core itself never fails.
#[derive(Error, Debug)]
pub enum VmposError {
    #[error("Can't read file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Can't parse YAML from file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error in {path} at line {line}: {message}")]
    Parse { path: String, line: usize, message: String },

    #[error("Invalid datacenter: {0}")]
    InvalidDatacenter(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid base solution: {0}")]
    InvalidBaseSolution(String),
}

pub type Result<T> = std::result::Result<T, VmposError>;

pub(crate) fn read_file(path: &str) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| VmposError::Io {
        path: path.to_string(),
        source,
    })
}
