// pan-collector/src/main.rs
//! pan-collector entry point.
//!
//! Sets up logging and operator output, then runs the export command.

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use pan_collector::cli::Cli;
use pan_collector::logger;
use pan_collector::ui::output::Output;
use pan_collector::{report_failure, run_export, ExportOptions};

fn main() -> Result<()> {
    let args = Cli::parse();

    if args.quiet {
        logger::init_logger(Some(LevelFilter::Off));
    } else if args.debug {
        logger::init_logger(Some(LevelFilter::Debug));
    } else {
        logger::init_logger(None);
    }

    let mut out = Output::stderr(args.quiet);
    let opts = ExportOptions {
        config_path: args.config,
        output_dir: args.output_dir,
    };

    if let Err(e) = run_export(&opts, &mut out) {
        report_failure(&e, &mut out);
        std::process::exit(1);
    }
    Ok(())
}
