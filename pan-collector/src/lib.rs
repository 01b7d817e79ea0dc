// pan-collector/src/lib.rs
//! # pan-collector CLI Application
//!
//! Command-line front end for `pan-collector-core`: parses arguments, sets up
//! logging and operator output, and runs the export command.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;

pub use commands::export::{report_failure, run_export, run_export_with, ExportOptions};
