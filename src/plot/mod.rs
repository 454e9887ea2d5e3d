//! Charts drawn from result tables.

pub mod definition;
pub mod render;
pub mod runner;
pub mod series;

pub use definition::PlotDefinition;
pub use runner::{run_plot, PlotOptions};
