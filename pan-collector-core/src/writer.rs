//! Writes the export mapping to a timestamped JSON file.

use chrono::{DateTime, Local};
use log::{debug, info};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::export::ExportMapping;

const EXPORT_FILE_TMP_SUFFIX: &str = ".tmp";

/// `export_YYYYMMDD-HHMMSS.json` for the given local time.
pub fn export_file_name(now: DateTime<Local>) -> String {
    format!("export_{}.json", now.format("%Y%m%d-%H%M%S"))
}

/// Serializes `export` into `dir`, named after the current local time.
///
/// Returns the path of the written file.
pub fn write_export(export: &ExportMapping, dir: &Path) -> Result<PathBuf> {
    write_export_at(export, dir, Local::now())
}

/// Writes the export named after `now`.
///
/// The JSON is written to a sibling temporary file first and renamed into
/// place, so the final path never holds a partial export. The temporary file
/// is removed if any step fails.
fn write_export_at(export: &ExportMapping, dir: &Path, now: DateTime<Local>) -> Result<PathBuf> {
    let path = dir.join(export_file_name(now));
    let tmp_path = dir.join(format!("{}{}", export_file_name(now), EXPORT_FILE_TMP_SUFFIX));

    let json = serde_json::to_vec_pretty(export)?;
    debug!("Serialized export: {} entries, {} bytes.", export.len(), json.len());

    let written = write_tmp(&tmp_path, &json).and_then(|()| fs::rename(&tmp_path, &path));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    info!("Export written to {}", path.display());
    Ok(path)
}

fn write_tmp(tmp_path: &Path, json: &[u8]) -> io::Result<()> {
    let mut tmp = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(tmp_path)?;
    tmp.write_all(json)?;
    tmp.flush()
}
