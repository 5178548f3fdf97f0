//! `wave_data.json` storage.
//!
//! Writes go through a temp file in the output directory followed by a
//! rename, so readers see either the previous document or the new one.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::logging::{self, Stage};
use crate::model::WaveReport;

/// ISO 8601 UTC with microseconds and a trailing `Z`.
pub fn iso_utc(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Human `last_updated` form, e.g. `01/05/2024 13:00 UTC`.
pub fn display_utc(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y %H:%M UTC").to_string()
}

/// Read the stored report. `Ok(None)` if there is no file yet.
pub fn read_report(path: &Path) -> io::Result<Option<WaveReport>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    let report = serde_json::from_str(&text)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(report))
}

/// Like [`read_report`], but an unreadable or malformed document counts as
/// no document. A corrupt file must not block the fallback paths.
pub fn load_report(path: &Path) -> Option<WaveReport> {
    match read_report(path) {
        Ok(report) => report,
        Err(e) => {
            logging::warn(
                Stage::Store,
                &format!("Ignoring unreadable {}: {}", path.display(), e),
            );
            None
        }
    }
}

/// Pretty-print the report and replace the stored document.
pub fn write_report(path: &Path, report: &WaveReport) -> io::Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    write_atomic(path, json.as_bytes())
}

/// Write `contents` to a sibling temp file, then rename it over `path`.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.flush()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
