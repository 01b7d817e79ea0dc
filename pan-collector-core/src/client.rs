//! The Panorama client seam and its PAN-OS XML API implementation.
//!
//! [`PanoramaClient`] is the contract the export builder depends on: list the
//! managed firewalls, run an operational command on Panorama, and run one
//! proxied to a specific firewall. [`PanoramaSession`] implements it over
//! HTTPS with a blocking `reqwest` client; tests substitute in-memory fakes.
//!
//! License: MIT OR Apache-2.0

use log::{debug, info};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::{AppConfig, Credentials};
use crate::errors::{CollectorError, Result};
use crate::xml::{parse_response, unwrap_response};

/// Lists the firewalls currently connected to Panorama.
pub const CONNECTED_DEVICES_CMD: &str = "<show><devices><connected/></devices></show>";

/// Probes the appliance when a session is established.
pub const SYSTEM_INFO_CMD: &str = "<show><system><info/></system></show>";

/// A firewall managed by Panorama, as reported by `show devices connected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedDevice {
    pub serial: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default, rename = "ip-address")]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, rename = "sw-version")]
    pub sw_version: Option<String>,
}

impl ManagedDevice {
    pub fn new(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            hostname: None,
            ip_address: None,
            model: None,
            sw_version: None,
        }
    }
}

/// Operations the export builder needs from Panorama.
///
/// The implementor owns the session; every call is a blocking round trip.
pub trait PanoramaClient {
    /// Returns the connected managed devices in the order Panorama lists them.
    fn list_connected(&self) -> Result<Vec<ManagedDevice>>;

    /// Runs an operational command on Panorama itself.
    fn op(&self, cmd: &str) -> Result<Value>;

    /// Runs an operational command on the managed device with serial `target`.
    fn op_on_device(&self, cmd: &str, target: &str) -> Result<Value>;
}

/// Extracts the device list from a `show devices connected` result tree.
///
/// `devices.entry` is a single object when exactly one firewall is connected,
/// an array when several are, and missing or null when none are.
pub fn devices_from_tree(tree: &Value) -> Result<Vec<ManagedDevice>> {
    let entries = match tree.get("devices").and_then(|d| d.get("entry")) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items.clone(),
        Some(single @ Value::Object(_)) => vec![single.clone()],
        Some(other) => {
            return Err(CollectorError::UnexpectedResponse(format!(
                "device entry is neither an object nor a list: {}",
                other
            )))
        }
    };

    entries
        .into_iter()
        .map(|entry| {
            serde_json::from_value::<ManagedDevice>(entry).map_err(|e| {
                CollectorError::UnexpectedResponse(format!("malformed device entry: {}", e))
            })
        })
        .collect()
}

/// An authenticated session against the Panorama XML API.
pub struct PanoramaSession {
    http: Client,
    url: String,
    api_key: String,
}

impl std::fmt::Debug for PanoramaSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanoramaSession")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl PanoramaSession {
    /// Builds the HTTP client, obtains an API key if needed, and probes the appliance.
    pub fn connect(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let url = config.api_url();

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .user_agent(concat!("pan-collector/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let api_key = match config.credentials() {
            Some(Credentials::ApiKey(key)) => key.to_string(),
            Some(Credentials::UserPassword { username, password }) => {
                debug!("No API key configured, generating one for user '{}'.", username);
                generate_api_key(&http, &url, username, password)?
            }
            None => {
                return Err(CollectorError::ConfigInvalid(
                    "no credentials configured".to_string(),
                ))
            }
        };

        let session = Self { http, url, api_key };

        let info_tree = session.op(SYSTEM_INFO_CMD)?;
        let system = info_tree.get("system");
        let field = |name: &str| {
            system
                .and_then(|s| s.get(name))
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string()
        };
        info!(
            "Connected to Panorama '{}' (PAN-OS {}).",
            field("hostname"),
            field("sw-version")
        );

        Ok(session)
    }

    /// The API endpoint this session talks to.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn execute(&self, params: &[(&str, &str)]) -> Result<Value> {
        let mut form: Vec<(&str, &str)> = params.to_vec();
        form.push(("key", self.api_key.as_str()));
        let body = post_form(&self.http, &self.url, &form)?;
        parse_response(&body)
    }
}

impl PanoramaClient for PanoramaSession {
    fn list_connected(&self) -> Result<Vec<ManagedDevice>> {
        let tree = self.op(CONNECTED_DEVICES_CMD)?;
        devices_from_tree(&tree)
    }

    fn op(&self, cmd: &str) -> Result<Value> {
        debug!("Running operational command on Panorama: {}", cmd);
        self.execute(&[("type", "op"), ("cmd", cmd)])
    }

    fn op_on_device(&self, cmd: &str, target: &str) -> Result<Value> {
        debug!("Running operational command on device {}: {}", target, cmd);
        self.execute(&[("type", "op"), ("cmd", cmd), ("target", target)])
    }
}

/// POSTs a form to the API and returns the body of a 2xx response.
///
/// A non-2xx response that still carries a PAN-OS error envelope is reported
/// with the appliance's message; anything else reports the HTTP status.
fn post_form(http: &Client, url: &str, form: &[(&str, &str)]) -> Result<String> {
    let request_type = form
        .iter()
        .find(|(k, _)| *k == "type")
        .map(|(_, v)| *v)
        .unwrap_or("?");
    debug!("POST {} (type={})", url, request_type);

    let response = http.post(url).form(form).send()?;
    let status = response.status();
    let body = response.text()?;

    if !status.is_success() {
        return Err(match unwrap_response(&body) {
            Err(api_err @ CollectorError::Api(_)) => api_err,
            _ => CollectorError::Api(format!("HTTP status {}", status)),
        });
    }
    Ok(body)
}

fn generate_api_key(http: &Client, url: &str, username: &str, password: &str) -> Result<String> {
    let body = post_form(
        http,
        url,
        &[("type", "keygen"), ("user", username), ("password", password)],
    )?;
    unwrap_response(&body)?
        .as_ref()
        .and_then(|result| result.child("key"))
        .map(|key| key.text.clone())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            CollectorError::UnexpectedResponse("keygen response did not contain a key".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_devices_from_array() {
        let tree = json!({"devices": {"entry": [
            {"@name": "001", "serial": "001", "hostname": "fw-a", "ip-address": "10.0.0.1"},
            {"@name": "002", "serial": "002", "hostname": null, "model": "PA-3220"}
        ]}});
        let devices = devices_from_tree(&tree).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].serial, "001");
        assert_eq!(devices[0].ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(devices[1].hostname, None);
        assert_eq!(devices[1].model.as_deref(), Some("PA-3220"));
    }

    #[test]
    fn test_devices_from_single_entry() {
        let tree = json!({"devices": {"entry": {"serial": "007"}}});
        assert_eq!(devices_from_tree(&tree).unwrap(), vec![ManagedDevice::new("007")]);
    }

    #[test]
    fn test_no_devices() {
        assert!(devices_from_tree(&json!({"devices": null})).unwrap().is_empty());
        assert!(devices_from_tree(&json!(null)).unwrap().is_empty());
    }

    #[test]
    fn test_entry_without_serial_is_rejected() {
        let tree = json!({"devices": {"entry": [{"hostname": "fw"}]}});
        assert!(matches!(
            devices_from_tree(&tree),
            Err(CollectorError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_session_debug_hides_key() {
        let session = PanoramaSession {
            http: Client::new(),
            url: "https://pano/api/".to_string(),
            api_key: "SECRETKEY".to_string(),
        };
        assert!(!format!("{:?}", session).contains("SECRETKEY"));
    }
}
