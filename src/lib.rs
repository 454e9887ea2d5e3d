//! Benchmark sweeps over external executables, CSV result tables,
//! and charts drawn from them.

pub mod config_file;
pub mod ctx;
pub mod get_terminal_width;
pub mod io_utils;
pub mod plot;
pub mod presets;
pub mod result_table;
pub mod serde;
pub mod stats;
pub mod sweep;
pub mod terminal_table;
pub mod utillib;
