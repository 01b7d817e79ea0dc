// pan-collector/src/cli.rs
//! Command-line interface definition for `pan-collector`.

use clap::Parser;
use std::path::PathBuf;

use pan_collector_core::CONFIG_FILE_NAME;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "pan-collector",
    version = env!("CARGO_PKG_VERSION"),
    about = "Export sanitized Panorama and managed-firewall configurations to JSON",
    long_about = "pan-collector connects to a Palo Alto Networks Panorama appliance, collects the effective running configuration of every connected firewall plus Panorama's candidate configuration, blanks out credential fields, and writes everything to export_<YYYYMMDD-HHMMSS>.json."
)]
pub struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, short = 'c', value_name = "FILE", env = "PAN_COLLECTOR_CONFIG", default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Directory the export file is written to.
    #[arg(long, short = 'o', value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Suppress progress messages; errors are still printed.
    #[arg(long, short = 'q', conflicts_with = "debug")]
    pub quiet: bool,

    /// Enable debug logging for pan-collector.
    #[arg(long, short = 'd')]
    pub debug: bool,
}
