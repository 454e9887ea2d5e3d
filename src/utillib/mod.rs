//! Various utilities

pub mod exit_status_ext;
pub mod logging;
