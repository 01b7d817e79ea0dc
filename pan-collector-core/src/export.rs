//! Builds the export mapping for a single collection run.
//!
//! The builder asks the [`PanoramaClient`] for the managed firewalls, fetches
//! each one's effective running configuration, then fetches Panorama's own
//! candidate configuration. Every tree is sanitized before it is stored, so
//! the mapping never holds credential material.
//!
//! A firewall that fails to answer is recorded and skipped; the run carries
//! on. A failure to list devices or to fetch Panorama's configuration is
//! returned to the caller.

use log::{info, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::{ManagedDevice, PanoramaClient};
use crate::errors::{CollectorError, Result};
use crate::sanitizer::SensitiveKeyRules;

/// Requests the fully resolved running configuration of a managed firewall.
pub const EFFECTIVE_RUNNING_CMD: &str = "<show><config><effective-running/></config></show>";

/// Requests Panorama's candidate configuration.
pub const CANDIDATE_CONFIG_CMD: &str = "<show><config><candidate></candidate></config></show>";

/// Reserved export key for Panorama's own configuration.
pub const PANORAMA_KEY: &str = "panorama";

/// Reported in place of error text that may contain a password.
pub const REDACTED_FAILURE_MESSAGE: &str = "<redacted for security reasons>";

/// Extra hint emitted alongside [`REDACTED_FAILURE_MESSAGE`].
pub const PASSWORD_HINT: &str = "Validate password is set correctly.";

/// Sanitized configuration trees keyed by device serial, plus `"panorama"`.
///
/// Serializes as a plain JSON object in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExportMapping {
    entries: Map<String, Value>,
}

impl ExportMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.entries)
    }

    fn insert(&mut self, key: String, tree: Value) {
        self.entries.insert(key, tree);
    }
}

/// A device whose configuration could not be collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFailure {
    pub serial: String,
    /// Safe-to-print description, see [`describe_device_failure`].
    pub message: String,
    /// True when the original error text was withheld.
    pub redacted: bool,
}

/// Outcome of the device collection stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceCollection {
    pub found: usize,
    pub collected: Vec<String>,
    pub skipped: Vec<String>,
    pub failures: Vec<DeviceFailure>,
}

/// Makes error text safe to print.
///
/// Returns the text and whether it was redacted. Text that mentions
/// "password", in any case, is replaced by [`REDACTED_FAILURE_MESSAGE`].
pub fn redact_error_text(text: &str) -> (String, bool) {
    if text.to_lowercase().contains("password") {
        (REDACTED_FAILURE_MESSAGE.to_string(), true)
    } else {
        (text.to_string(), false)
    }
}

/// Renders `err` for the operator without leaking a password.
pub fn describe_device_failure(err: &CollectorError) -> (String, bool) {
    redact_error_text(&err.to_string())
}

/// Receives progress events during a run. All methods default to no-ops.
pub trait ExportProgress {
    fn devices_listed(&mut self, _count: usize) {}
    fn device_started(&mut self, _ordinal: usize, _total: usize, _device: &ManagedDevice) {}
    fn device_collected(&mut self, _serial: &str) {}
    fn device_failed(&mut self, _failure: &DeviceFailure) {}
    fn devices_done(&mut self, _summary: &DeviceCollection) {}
    fn panorama_started(&mut self) {}
    fn panorama_collected(&mut self) {}
}

/// Forwards progress events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ExportProgress for LogProgress {
    fn devices_listed(&mut self, count: usize) {
        info!("Found {} connected devices.", count);
    }

    fn device_started(&mut self, ordinal: usize, total: usize, device: &ManagedDevice) {
        info!("({}/{}) Collecting config from device {}...", ordinal, total, device.serial);
    }

    fn device_failed(&mut self, failure: &DeviceFailure) {
        warn!("Failed to collect {}: {}", failure.serial, failure.message);
        if failure.redacted {
            warn!("{}", PASSWORD_HINT);
        }
    }

    fn panorama_collected(&mut self) {
        info!("Panorama config collected.");
    }
}

/// Accumulates sanitized configuration trees for one run.
pub struct ExportBuilder<'a, C: PanoramaClient + ?Sized> {
    client: &'a C,
    rules: &'a SensitiveKeyRules,
    export: ExportMapping,
}

impl<'a, C: PanoramaClient + ?Sized> ExportBuilder<'a, C> {
    pub fn new(client: &'a C, rules: &'a SensitiveKeyRules) -> Self {
        Self {
            client,
            rules,
            export: ExportMapping::new(),
        }
    }

    /// Collects the effective running configuration of every connected device.
    ///
    /// Fails only when the device list itself cannot be retrieved.
    pub fn collect_devices(&mut self, progress: &mut dyn ExportProgress) -> Result<DeviceCollection> {
        let devices = self.client.list_connected()?;
        progress.devices_listed(devices.len());

        let mut summary = DeviceCollection {
            found: devices.len(),
            ..Default::default()
        };

        for (index, device) in devices.iter().enumerate() {
            let serial = device.serial.as_str();
            if serial == PANORAMA_KEY || self.export.contains(serial) {
                warn!("Skipping device with duplicate or reserved serial '{}'.", serial);
                summary.skipped.push(serial.to_string());
                continue;
            }

            progress.device_started(index + 1, devices.len(), device);
            match self.client.op_on_device(EFFECTIVE_RUNNING_CMD, serial) {
                Ok(effective) => {
                    self.export.insert(serial.to_string(), self.rules.sanitize(&effective));
                    summary.collected.push(serial.to_string());
                    progress.device_collected(serial);
                }
                Err(err) => {
                    let (message, redacted) = describe_device_failure(&err);
                    let failure = DeviceFailure {
                        serial: serial.to_string(),
                        message,
                        redacted,
                    };
                    progress.device_failed(&failure);
                    summary.failures.push(failure);
                }
            }
        }

        progress.devices_done(&summary);
        Ok(summary)
    }

    /// Collects Panorama's candidate configuration under [`PANORAMA_KEY`].
    pub fn collect_panorama(&mut self, progress: &mut dyn ExportProgress) -> Result<()> {
        progress.panorama_started();
        let candidate = self.client.op(CANDIDATE_CONFIG_CMD)?;
        self.export
            .insert(PANORAMA_KEY.to_string(), self.rules.sanitize(&candidate));
        progress.panorama_collected();
        Ok(())
    }

    pub fn finish(self) -> ExportMapping {
        self.export
    }
}

/// Runs both collection stages, devices first, and returns the mapping.
pub fn collect_export<C: PanoramaClient + ?Sized>(
    client: &C,
    rules: &SensitiveKeyRules,
    progress: &mut dyn ExportProgress,
) -> Result<(ExportMapping, DeviceCollection)> {
    let mut builder = ExportBuilder::new(client, rules);
    let summary = builder.collect_devices(progress)?;
    builder.collect_panorama(progress)?;
    Ok((builder.finish(), summary))
}
