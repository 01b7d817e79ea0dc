// pan-collector-core/src/lib.rs
//! # pan-collector core library
//!
//! `pan-collector-core` retrieves configuration from a Palo Alto Networks
//! Panorama appliance and the firewalls it manages, strips credential
//! material from it, and writes the result to a timestamped JSON file.
//!
//! ## Modules
//!
//! * `config`: `AppConfig`, loaded from `config.json`.
//! * `client`: the `PanoramaClient` seam and the `PanoramaSession` XML API implementation.
//! * `xml`: decoding of PAN-OS response envelopes into configuration trees.
//! * `sanitizer`: `SensitiveKeyRules` and the recursive redaction walk.
//! * `export`: `ExportBuilder`, which collects and sanitizes every tree for a run.
//! * `writer`: serialization of the export mapping to disk.
//! * `errors`: the `CollectorError` type.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use pan_collector_core::{
//!     collect_export, write_export, AppConfig, LogProgress, PanoramaSession, DEFAULT_RULES,
//! };
//! use std::path::Path;
//!
//! fn main() -> pan_collector_core::Result<()> {
//!     let config = AppConfig::load_from_file("config.json")?;
//!     let session = PanoramaSession::connect(&config)?;
//!
//!     let (export, summary) = collect_export(&session, &DEFAULT_RULES, &mut LogProgress)?;
//!     println!("{} of {} devices collected", summary.collected.len(), summary.found);
//!
//!     let path = write_export(&export, Path::new("."))?;
//!     println!("Export complete: {}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod client;
pub mod config;
pub mod errors;
pub mod export;
pub mod sanitizer;
pub mod writer;
pub mod xml;

/// Re-exports configuration loading.
pub use config::{AppConfig, Credentials, CONFIG_FILE_NAME};

/// Re-exports the error type and result alias.
pub use errors::{CollectorError, Result};

/// Re-exports the Panorama client seam and its HTTP implementation.
pub use client::{ManagedDevice, PanoramaClient, PanoramaSession};

/// Re-exports sanitization rules.
pub use sanitizer::{SensitiveKeyRules, DEFAULT_RULES};

/// Re-exports the export stage.
pub use export::{
    collect_export, describe_device_failure, redact_error_text, DeviceCollection, DeviceFailure,
    ExportBuilder, ExportMapping, ExportProgress, LogProgress, CANDIDATE_CONFIG_CMD,
    EFFECTIVE_RUNNING_CMD, PANORAMA_KEY, PASSWORD_HINT, REDACTED_FAILURE_MESSAGE,
};

/// Re-exports the writer.
pub use writer::{export_file_name, write_export};
