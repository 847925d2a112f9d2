//! Shared domain types.
//!
//! Records and summaries are kept as plain owned data so they can be:
//!
//! - aggregated without hidden state
//! - shared across threads inside an `Arc<Snapshot>`
//! - exported to CSV/JSON as-is

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Diagnosis substring marking a confirmed-positive test.
pub const POSITIVE_KEYWORD: &str = "Positiu";

/// Diagnosis substring marking a suspected (not confirmed) case.
pub const SUSPECTED_KEYWORD: &str = "Sospitós";

/// Date format used by the source CSV.
pub const SOURCE_DATE_FORMAT: &str = "%d/%m/%Y";

/// The five logical fields the loader needs from the source CSV.
///
/// Source headers drift between snapshots (prefixes, suffixes, language tags),
/// so each field is located by a fixed fragment that must appear in exactly one
/// header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataColumn {
    Date,
    RegionCode,
    RegionText,
    Diagnosis,
    Cases,
}

impl DataColumn {
    pub const ALL: [DataColumn; 5] = [
        DataColumn::Date,
        DataColumn::RegionCode,
        DataColumn::RegionText,
        DataColumn::Diagnosis,
        DataColumn::Cases,
    ];

    /// Fragment searched for (case-sensitive) in the source headers.
    pub fn fragment(self) -> &'static str {
        match self {
            DataColumn::Date => "TipusCasData",
            DataColumn::RegionCode => "ABSCodi",
            DataColumn::RegionText => "ABSDescripcio",
            DataColumn::Diagnosis => "TipusCasDescripcio",
            DataColumn::Cases => "NumCasos",
        }
    }

    /// Canonical name the resolved column is known by.
    pub fn canonical_name(self) -> &'static str {
        match self {
            DataColumn::Date => "Date",
            DataColumn::RegionCode => "ABSCode",
            DataColumn::RegionText => "ABSText",
            DataColumn::Diagnosis => "Diagnose",
            DataColumn::Cases => "Cases",
        }
    }

    /// Rows missing one of these fields are dropped at load time.
    pub fn is_required(self) -> bool {
        matches!(self, DataColumn::Date | DataColumn::Diagnosis | DataColumn::Cases)
    }
}

/// One normalized row of the source CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    pub date: NaiveDate,
    pub region_code: String,
    pub region_name: String,
    pub diagnosis: String,
    pub cases: i64,
}

impl TestRecord {
    pub fn is_positive(&self) -> bool {
        self.diagnosis.contains(POSITIVE_KEYWORD)
    }

    pub fn is_suspected(&self) -> bool {
        self.diagnosis.contains(SUSPECTED_KEYWORD)
    }

    pub fn region_key(&self) -> RegionKey {
        RegionKey {
            code: self.region_code.clone(),
            name: self.region_name.clone(),
        }
    }
}

/// Loader output: records in source order plus what happened along the way.
#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    pub records: Vec<TestRecord>,
    /// Data rows seen in the source (header excluded).
    pub rows_read: usize,
    /// Rows discarded for a missing date, diagnosis or case count.
    pub rows_dropped: usize,
}

impl NormalizedTable {
    pub fn new(records: Vec<TestRecord>) -> Self {
        let rows_read = records.len();
        Self {
            records,
            rows_read,
            rows_dropped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Grouping key for regional totals (ABS code plus its display name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionKey {
    pub code: String,
    pub name: String,
}

impl RegionKey {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Date → total cases recorded that date.
pub type DailySummary = BTreeMap<NaiveDate, i64>;

/// Date → percentage (0–100, two decimals) of that date's cases that are positive.
pub type DailyPositivity = BTreeMap<NaiveDate, f64>;

/// Region → total cases across all dates.
pub type RegionalSummary = BTreeMap<RegionKey, i64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_date_diagnosis_and_cases_are_required() {
        let required: Vec<_> = DataColumn::ALL.iter().filter(|c| c.is_required()).collect();
        assert_eq!(
            required,
            vec![&DataColumn::Date, &DataColumn::Diagnosis, &DataColumn::Cases]
        );
    }

    #[test]
    fn positive_match_is_case_sensitive() {
        let mut record = TestRecord {
            date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            region_code: "R1".to_string(),
            region_name: "R1 Name".to_string(),
            diagnosis: "Positiu PCR".to_string(),
            cases: 1,
        };
        assert!(record.is_positive());
        record.diagnosis = "positiu PCR".to_string();
        assert!(!record.is_positive());
        record.diagnosis = SUSPECTED_KEYWORD.to_string();
        assert!(!record.is_positive());
        assert!(record.is_suspected());
    }
}
