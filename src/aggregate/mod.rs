//! Summaries derived from a normalized table.
//!
//! Every function here is pure: the same records always produce the same
//! summary, and none of them depends on another having run first. Sums
//! saturate at the `i64` bounds instead of overflowing.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{DailyPositivity, DailySummary, RegionalSummary, TestRecord};

/// Total cases per date. Dates without records are absent, not zero.
pub fn daily_tests(records: &[TestRecord]) -> DailySummary {
    let mut out = DailySummary::new();
    for r in records {
        let sum = out.entry(r.date).or_insert(0);
        *sum = sum.saturating_add(r.cases);
    }
    out
}

/// Percentage of each date's cases with a positive diagnosis.
///
/// Dates whose cases sum to zero report `0.0`.
pub fn daily_positive_rate(records: &[TestRecord]) -> DailyPositivity {
    // date -> (positive, total)
    let mut totals: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    for r in records {
        let entry = totals.entry(r.date).or_insert((0, 0));
        if r.is_positive() {
            entry.0 = entry.0.saturating_add(r.cases);
        }
        entry.1 = entry.1.saturating_add(r.cases);
    }

    totals
        .into_iter()
        .map(|(date, (positive, total))| (date, positive_pct(positive, total)))
        .collect()
}

/// Total cases per (ABS code, ABS name).
pub fn tests_per_region(records: &[TestRecord]) -> RegionalSummary {
    let mut out = RegionalSummary::new();
    for r in records {
        let sum = out.entry(r.region_key()).or_insert(0);
        *sum = sum.saturating_add(r.cases);
    }
    out
}

/// Sum of cases over all records.
pub fn total_tests(records: &[TestRecord]) -> i64 {
    records.iter().fold(0i64, |acc, r| acc.saturating_add(r.cases))
}

fn positive_pct(positive: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    // Negative counts are summed as-is, which can push the ratio outside 0..=100.
    round2((positive as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
}

/// Round half away from zero to two decimals.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
