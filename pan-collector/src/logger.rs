// pan-collector/src/logger.rs
//! Logger initialization built on `env_logger`.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Crates whose level `--debug` raises.
const OWN_CRATES: &[&str] = &["pan_collector", "pan_collector_core"];

/// Initializes the global logger once; later calls are ignored.
///
/// * `None` - honour `RUST_LOG`, defaulting to `warn`.
/// * `Some(LevelFilter::Off)` - silence all logging.
/// * `Some(level)` - `RUST_LOG` for other crates, `level` for this project's crates.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    builder.format_timestamp_secs();

    match level {
        Some(LevelFilter::Off) => {
            builder.filter_level(LevelFilter::Off);
        }
        Some(level) => {
            for module in OWN_CRATES {
                builder.filter_module(module, level);
            }
        }
        None => {}
    }

    let _ = builder.try_init();
}
