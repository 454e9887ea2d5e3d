//! Types with custom (de)serialization used in definition files

pub mod regex;
