//! The CSV layout shared by the sweep driver (writing) and the
//! plotter (reading):
//!
//! `<axis columns> | Run | <metric columns> | <average columns>`
//!
//! Each configuration point contributes one row per run, numbered
//! from 1, followed by one row with `Average` in the `Run` column.

pub mod reader;
pub mod schema;
pub mod writer;

use std::path::PathBuf;

pub use reader::{ResultTable, RowSelection};
pub use schema::ResultSchema;
pub use writer::ResultWriter;

pub const RUN_COLUMN: &str = "Run";
pub const AVERAGE_SENTINEL: &str = "Average";
/// Cell content for a metric that could not be measured
pub const UNAVAILABLE: &str = "N/A";

#[derive(thiserror::Error, Debug)]
pub enum TableError {
    #[error("CSV file {0:?} does not exist")]
    Missing(PathBuf),
    #[error("could not read CSV file {path:?}: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("CSV file has no column {0:?}")]
    MissingColumn(String),
}
