//! Export snapshot views to CSV and JSON.
//!
//! CSV exports are meant for spreadsheets; the JSON export is the full snapshot
//! and can be read back with `read_snapshot_json`.

use std::fs::File;
use std::path::Path;

use crate::error::{AppError, ErrorKind};
use crate::snapshot::Snapshot;

/// Writes `date,tests,positive_pct`, one row per date with data.
pub fn write_daily_csv(path: &Path, snapshot: &Snapshot) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| export_err(path, e))?;

    writer
        .write_record(["date", "tests", "positive_pct"])
        .map_err(|e| export_err(path, e))?;

    for (date, tests) in &snapshot.daily_tests {
        let pct = snapshot.daily_positivity.get(date).copied().unwrap_or(0.0);
        writer
            .write_record([date.to_string(), tests.to_string(), format!("{pct:.2}")])
            .map_err(|e| export_err(path, e))?;
    }

    writer.flush().map_err(|e| export_err(path, e))
}

/// Writes `abs_code,abs_name,total_tests` with regions in code order.
pub fn write_regions_csv(path: &Path, snapshot: &Snapshot) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| export_err(path, e))?;

    writer
        .write_record(["abs_code", "abs_name", "total_tests"])
        .map_err(|e| export_err(path, e))?;

    for (region, total) in &snapshot.regional {
        writer
            .write_record([region.code.as_str(), region.name.as_str(), total.to_string().as_str()])
            .map_err(|e| export_err(path, e))?;
    }

    writer.flush().map_err(|e| export_err(path, e))
}

pub fn write_snapshot_json(path: &Path, snapshot: &Snapshot) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| export_err(path, e))?;
    serde_json::to_writer_pretty(file, snapshot).map_err(|e| export_err(path, e))
}

pub fn read_snapshot_json(path: &Path) -> Result<Snapshot, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::unavailable(format!("Failed to open snapshot JSON '{}': {e}", path.display()))
    })?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::unavailable(format!("Invalid snapshot JSON '{}': {e}", path.display())))
}

fn export_err(path: &Path, e: impl std::fmt::Display) -> AppError {
    AppError::new(
        ErrorKind::Export,
        format!("Failed to write export '{}': {e}", path.display()),
    )
}
