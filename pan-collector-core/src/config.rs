//! Configuration management for `pan-collector-core`.
//!
//! The collector reads a single JSON file (`config.json` by default) that
//! tells it where Panorama lives and how to authenticate. Loading fails
//! before any network activity when the file is missing, malformed, or
//! incomplete.
//!
//! License: MIT OR Apache-2.0

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::errors::{CollectorError, Result};

/// Default configuration file name, resolved against the working directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

fn default_verify_tls() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Connection settings for a Panorama appliance.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Panorama host, optionally with scheme and port (e.g. `panorama.corp` or `https://10.0.0.5:8443`).
    pub hostname: String,
    /// Pre-generated PAN-OS API key. Takes precedence over username/password.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Reject invalid TLS certificates. Appliances often run with self-signed certs.
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// Credentials never reach logs through `{:?}`.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(v: &Option<String>) -> Option<&'static str> {
            v.as_ref().map(|_| "[REDACTED]")
        }
        f.debug_struct("AppConfig")
            .field("hostname", &self.hostname)
            .field("api_key", &mask(&self.api_key))
            .field("username", &self.username)
            .field("password", &mask(&self.password))
            .field("verify_tls", &self.verify_tls)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// How the session obtains its API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credentials<'a> {
    ApiKey(&'a str),
    UserPassword { username: &'a str, password: &'a str },
}

impl AppConfig {
    /// Loads and validates the configuration from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CollectorError::ConfigNotFound(path.to_path_buf()));
        }
        info!("Loading configuration from: {}", path.display());

        let text = std::fs::read_to_string(path)?;
        let config: AppConfig =
            serde_json::from_str(&text).map_err(|source| CollectorError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;

        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Checks that the configuration can establish a session.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.hostname.trim().is_empty() {
            errors.push("`hostname` must not be empty.".to_string());
        }
        if self.timeout_secs == 0 {
            errors.push("`timeout_secs` must be greater than zero.".to_string());
        }
        if self.credentials().is_none() {
            errors.push(
                "either `api_key` or both `username` and `password` must be set.".to_string(),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CollectorError::ConfigInvalid(errors.join(" ")))
        }
    }

    /// Returns the credentials to use, preferring a non-empty API key.
    pub fn credentials(&self) -> Option<Credentials<'_>> {
        fn non_empty(v: &Option<String>) -> Option<&str> {
            v.as_deref().filter(|s| !s.is_empty())
        }

        if let Some(key) = non_empty(&self.api_key) {
            return Some(Credentials::ApiKey(key));
        }
        match (non_empty(&self.username), non_empty(&self.password)) {
            (Some(username), Some(password)) => Some(Credentials::UserPassword { username, password }),
            _ => None,
        }
    }

    /// The XML API endpoint, adding `https://` when no scheme is configured.
    pub fn api_url(&self) -> String {
        let host = self.hostname.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}/api/", host)
        } else {
            format!("https://{}/api/", host)
        }
    }
}
