//! errors.rs - Error types for the pan-collector-core library.
//!
//! Every fallible operation in the library returns [`CollectorError`]. The
//! variants separate the stages of a run (configuration, transport, API,
//! decoding, output) so the binary can report which one failed.
//!
//! License: MIT OR APACHE 2.0

use std::path::PathBuf;
use thiserror::Error;

/// All error types produced by `pan-collector-core`.
///
/// Marked `#[non_exhaustive]` so new variants can be added without breaking
/// downstream matches.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CollectorError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Failed to parse configuration file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request to Panorama failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Panorama API returned an error: {0}")]
    Api(String),

    #[error("Failed to decode XML response: {0}")]
    Xml(String),

    #[error("Unexpected response from Panorama: {0}")]
    UnexpectedResponse(String),

    #[error("Failed to serialize export: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Convenience alias used across the library.
pub type Result<T> = std::result::Result<T, CollectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: CollectorError = io_err.into();
        assert!(matches!(err, CollectorError::IoError(_)));
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn config_not_found_names_the_path() {
        let err = CollectorError::ConfigNotFound(PathBuf::from("/tmp/config.json"));
        assert_eq!(err.to_string(), "Configuration file not found: /tmp/config.json");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CollectorError>();
    }
}
