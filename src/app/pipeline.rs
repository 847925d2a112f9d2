//! Shared "load → aggregate" logic used by the CLI commands and the TUI.
//!
//! Keeping this in one place means every front-end builds snapshots the same
//! way: the TUI only decides *when* to call it, and the CLI only decides what
//! to print.

use chrono::Utc;

use crate::error::AppError;
use crate::io::ingest::{self, DataSource};
use crate::snapshot::Snapshot;

/// Load the source in full and aggregate it into a new snapshot.
pub fn build_snapshot(source: &DataSource) -> Result<Snapshot, AppError> {
    let table = ingest::load(source)?;
    Ok(Snapshot::from_table(&table, source.to_string(), Utc::now()))
}
