//! The export command: load config, connect, collect, write.

use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

use pan_collector_core::{
    collect_export, redact_error_text, write_export, AppConfig, DeviceCollection, DeviceFailure,
    ExportProgress, ManagedDevice, PanoramaClient, PanoramaSession, DEFAULT_RULES, PASSWORD_HINT,
};

use crate::ui::output::Output;

/// Inputs of a single export run.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub config_path: PathBuf,
    pub output_dir: PathBuf,
}

/// Prints builder progress the way operators expect from the collector.
struct ConsoleProgress<'a> {
    out: &'a mut Output,
}

impl ExportProgress for ConsoleProgress<'_> {
    fn devices_listed(&mut self, count: usize) {
        self.out.info(format!("  Found {} connected devices.", count));
    }

    fn device_started(&mut self, ordinal: usize, total: usize, device: &ManagedDevice) {
        self.out.info(format!(
            "  ({}/{}) Collecting config from device {}...",
            ordinal, total, device.serial
        ));
    }

    fn device_failed(&mut self, failure: &DeviceFailure) {
        self.out
            .warn(format!("Failed to collect {}: {}", failure.serial, failure.message));
        if failure.redacted {
            self.out.warn(format!("** {} **", PASSWORD_HINT));
        }
    }

    fn devices_done(&mut self, summary: &DeviceCollection) {
        debug!(
            "Device stage: {} found, {} collected, {} failed, {} skipped.",
            summary.found,
            summary.collected.len(),
            summary.failures.len(),
            summary.skipped.len()
        );
        self.out.info("  Device collection complete.");
    }

    fn panorama_started(&mut self) {
        self.out.header("[2/3] Collecting Panorama configuration...");
    }

    fn panorama_collected(&mut self) {
        self.out.info("  Panorama config collected.");
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let cwd = std::env::current_dir().context("Failed to resolve the working directory")?;
        Ok(cwd.join(path))
    }
}

/// Runs the full export against the Panorama described by the config file.
///
/// Returns the path of the written export.
pub fn run_export(opts: &ExportOptions, out: &mut Output) -> Result<PathBuf> {
    let config_path = absolute(&opts.config_path)?;
    out.info("Starting Panorama config collector.");
    out.info(format!("Looking for config file: {}", config_path.display()));
    if !config_path.exists() {
        bail!(
            "{} not found. Create it or pass --config.",
            config_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| config_path.display().to_string())
        );
    }

    out.info("Loading configuration...");
    let config = AppConfig::load_from_file(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    out.info("Establishing Panorama session...");
    let session = PanoramaSession::connect(&config)
        .with_context(|| format!("Failed to establish a session with {}", config.hostname))?;
    out.success("Connection established successfully.");

    run_export_with(&session, &opts.output_dir, out)
}

/// Collects and writes an export using an already connected client.
pub fn run_export_with<C: PanoramaClient + ?Sized>(
    client: &C,
    output_dir: &Path,
    out: &mut Output,
) -> Result<PathBuf> {
    let output_dir = absolute(output_dir)?;

    out.header("[1/3] Collecting device list from Panorama...");
    let (export, summary) = {
        let mut progress = ConsoleProgress { out: &mut *out };
        collect_export(client, &DEFAULT_RULES, &mut progress)
            .context("Failed to collect configuration from Panorama")?
    };
    info!(
        "Collected {} of {} devices plus Panorama.",
        summary.collected.len(),
        summary.found
    );

    out.header("[3/3] Writing export to JSON file...");
    let path = write_export(&export, &output_dir)
        .with_context(|| format!("Failed to write export to {}", output_dir.display()))?;
    out.success(format!("  Export complete: {}", path.display()));

    out.success("All tasks completed successfully.");
    Ok(path)
}

/// Prints a fatal error with its context chain, withholding password text.
pub fn report_failure(err: &anyhow::Error, out: &mut Output) {
    let (message, redacted) = redact_error_text(&format!("{:#}", err));
    out.error(format!("ERROR: {}", message));
    if redacted {
        out.error(format!("** {} **", PASSWORD_HINT));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pan_collector_core::{CollectorError, Result as CoreResult};
    use serde_json::{json, Value};
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FakeClient;

    struct RejectingPanorama;

    impl PanoramaClient for RejectingPanorama {
        fn list_connected(&self) -> CoreResult<Vec<ManagedDevice>> {
            Ok(Vec::new())
        }

        fn op(&self, _cmd: &str) -> CoreResult<Value> {
            Err(CollectorError::Api("Authentication failed: password=hunter2".to_string()))
        }

        fn op_on_device(&self, _cmd: &str, _target: &str) -> CoreResult<Value> {
            unreachable!("no devices are listed")
        }
    }

    impl PanoramaClient for FakeClient {
        fn list_connected(&self) -> CoreResult<Vec<ManagedDevice>> {
            Ok(vec![
                ManagedDevice::new("S1"),
                ManagedDevice::new("S2"),
                ManagedDevice::new("S3"),
            ])
        }

        fn op(&self, _cmd: &str) -> CoreResult<Value> {
            Ok(json!({"config": {"secret": "x"}}))
        }

        fn op_on_device(&self, _cmd: &str, target: &str) -> CoreResult<Value> {
            match target {
                "S2" => Err(CollectorError::Api("Authentication failed: password=hunter2".to_string())),
                "S3" => Err(CollectorError::Api("connection refused".to_string())),
                _ => Ok(json!({"config": {"hostname": target}})),
            }
        }
    }

    #[test]
    fn test_run_export_with_reports_progress_and_redacts() {
        let dir = tempfile::tempdir().unwrap();
        let buf = SharedBuf::default();
        let mut out = Output::to_writer(false, Box::new(buf.clone()));

        let path = run_export_with(&FakeClient, dir.path(), &mut out).unwrap();
        assert!(path.starts_with(dir.path()));

        let log = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(log.contains("Found 3 connected devices."));
        assert!(log.contains("(2/3) Collecting config from device S2..."));
        assert!(log.contains("Failed to collect S2: <redacted for security reasons>"));
        assert!(log.contains("Failed to collect S3: Panorama API returned an error: connection refused"));
        assert!(!log.contains("hunter2"));

        let failure_line = log
            .lines()
            .find(|l| l.starts_with("Failed to collect S2"))
            .unwrap();
        assert!(!failure_line.to_lowercase().contains("password"));

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["panorama"]["config"]["secret"], json!(""));
        assert_eq!(
            written.as_object().unwrap().keys().collect::<Vec<_>>(),
            vec!["S1", "panorama"]
        );
    }

    #[test]
    fn test_missing_config_fails_before_connecting() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Output::to_writer(true, Box::new(io::sink()));
        let opts = ExportOptions {
            config_path: dir.path().join("config.json"),
            output_dir: dir.path().to_path_buf(),
        };
        let err = run_export(&opts, &mut out).unwrap_err();
        assert!(err.to_string().contains("config.json not found"));
    }

    #[test]
    fn test_fatal_password_error_is_reported_redacted() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Output::to_writer(true, Box::new(io::sink()));
        let err = run_export_with(&RejectingPanorama, dir.path(), &mut out).unwrap_err();

        let buf = SharedBuf::default();
        let mut out = Output::to_writer(false, Box::new(buf.clone()));
        report_failure(&err, &mut out);

        let printed = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(!printed.contains("hunter2"));
        assert_eq!(
            printed,
            "ERROR: <redacted for security reasons>\n** Validate password is set correctly. **\n"
        );
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_fatal_error_keeps_context_chain() {
        let err = anyhow::anyhow!("HTTP status 502 Bad Gateway").context("Failed to establish a session");
        let buf = SharedBuf::default();
        let mut out = Output::to_writer(true, Box::new(buf.clone()));
        report_failure(&err, &mut out);

        let printed = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(
            printed,
            "ERROR: Failed to establish a session: HTTP status 502 Bad Gateway\n"
        );
    }
}
