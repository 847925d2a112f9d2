//! Aggregated snapshots and the holder that swaps them.
//!
//! A `Snapshot` is built in full from one load of the source and never mutated
//! afterwards. `SnapshotStore` owns the current one: readers clone an `Arc` and
//! therefore always see a complete snapshot, old or new.

use std::sync::{Arc, Mutex, RwLock, TryLockError};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::aggregate;
use crate::domain::{DailyPositivity, DailySummary, NormalizedTable, RegionKey, RegionalSummary};
use crate::error::AppError;

/// One fully aggregated view of the source data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub loaded_at: DateTime<Utc>,
    pub source: String,
    pub rows_read: usize,
    pub rows_used: usize,
    pub rows_dropped: usize,
    pub total_tests: i64,
    pub daily_tests: DailySummary,
    pub daily_positivity: DailyPositivity,
    #[serde(with = "region_entries")]
    pub regional: RegionalSummary,
}

impl Snapshot {
    pub fn from_table(table: &NormalizedTable, source: impl Into<String>, loaded_at: DateTime<Utc>) -> Self {
        let records = table.records.as_slice();
        let ((daily_tests, daily_positivity), (regional, total_tests)) = rayon::join(
            || {
                rayon::join(
                    || aggregate::daily_tests(records),
                    || aggregate::daily_positive_rate(records),
                )
            },
            || {
                rayon::join(
                    || aggregate::tests_per_region(records),
                    || aggregate::total_tests(records),
                )
            },
        );

        Self {
            loaded_at,
            source: source.into(),
            rows_read: table.rows_read,
            rows_used: table.len(),
            rows_dropped: table.rows_dropped,
            total_tests,
            daily_tests,
            daily_positivity,
            regional,
        }
    }

    /// First and last date with data.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.daily_tests.keys().next()?;
        let last = self.daily_tests.keys().next_back()?;
        Some((*first, *last))
    }

    /// Regions sorted by descending total (ties by code).
    pub fn ranked_regions(&self) -> Vec<(&RegionKey, i64)> {
        let mut out: Vec<_> = self.regional.iter().map(|(k, v)| (k, *v)).collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        out
    }
}

/// Result of one refresh attempt.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Updated(Arc<Snapshot>),
    /// The previous snapshot (if any) stays current.
    Failed(AppError),
    /// Another refresh was already running.
    Skipped,
}

/// Holds the current snapshot and serializes refreshes.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Option<Arc<Snapshot>>>,
    refresh_guard: Mutex<()>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<Snapshot>> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Build a new snapshot with `build` and make it current.
    ///
    /// Only one refresh runs at a time; overlapping calls return `Skipped`
    /// without invoking `build`.
    pub fn refresh_with<F>(&self, build: F) -> RefreshOutcome
    where
        F: FnOnce() -> Result<Snapshot, AppError>,
    {
        let _running = match self.refresh_guard.try_lock() {
            Ok(guard) => guard,
            // A panicked build poisons the guard; the next refresh may still run.
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                warn!("refresh already in progress; skipping");
                return RefreshOutcome::Skipped;
            }
        };

        match build() {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                info!(
                    rows_used = snapshot.rows_used,
                    dates = snapshot.daily_tests.len(),
                    regions = snapshot.regional.len(),
                    "snapshot refreshed"
                );
                self.replace(Arc::clone(&snapshot));
                RefreshOutcome::Updated(snapshot)
            }
            Err(err) => {
                error!(
                    kind = ?err.kind(),
                    stale = self.current().is_some(),
                    "refresh failed: {err}"
                );
                RefreshOutcome::Failed(err)
            }
        }
    }

    fn replace(&self, snapshot: Arc<Snapshot>) {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(snapshot);
    }
}

/// JSON objects need string keys, so regional totals travel as a list.
mod region_entries {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::domain::{RegionKey, RegionalSummary};

    #[derive(Serialize, Deserialize)]
    struct Entry {
        code: String,
        name: String,
        total_tests: i64,
    }

    pub fn serialize<S: Serializer>(map: &RegionalSummary, s: S) -> Result<S::Ok, S::Error> {
        let entries: Vec<Entry> = map
            .iter()
            .map(|(k, v)| Entry {
                code: k.code.clone(),
                name: k.name.clone(),
                total_tests: *v,
            })
            .collect();
        entries.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<RegionalSummary, D::Error> {
        let entries = Vec::<Entry>::deserialize(d)?;
        Ok(entries
            .into_iter()
            .map(|e| (RegionKey { code: e.code, name: e.name }, e.total_tests))
            .collect())
    }
}
