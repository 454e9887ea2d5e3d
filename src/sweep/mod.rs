//! Running external executables over the configuration points of a
//! sweep, and recording their measurements.

pub mod axis;
pub mod definition;
pub mod measure;
pub mod metric;
pub mod preflight;
pub mod runner;
pub mod template;

use std::path::PathBuf;

pub use definition::SweepDefinition;
pub use runner::{run_sweep, SweepOptions, SweepSummary};

#[derive(thiserror::Error, Debug)]
pub enum SweepError {
    #[error("executable {name:?} not found at {path:?}")]
    MissingExecutable { name: String, path: PathBuf },
    #[error("executable {name:?} at {path:?} is not executable")]
    NotExecutable { name: String, path: PathBuf },
    #[error("none of the executables of sweep {0:?} are available")]
    NoExecutables(String),
    #[error("required file {0:?} does not exist")]
    MissingRequiredFile(PathBuf),
    #[error("command {command} failed with {status}")]
    CommandFailed { command: String, status: String },
    #[error("command {command} did not finish within {secs} seconds")]
    TimedOut { command: String, secs: f64 },
    #[error("could not extract metric {metric:?}: {reason}")]
    Extraction { metric: String, reason: String },
    #[error("invalid sweep definition {0}")]
    InvalidDefinition(String),
}
