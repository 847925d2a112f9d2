//! CSV ingest and normalization.
//!
//! This module is responsible for turning a raw testing-records CSV into a
//! `NormalizedTable` that the aggregator can consume without further checks.
//!
//! Design goals:
//! - **Fail-fast schema**: every logical column must resolve to exactly one header
//! - **Silent row filtering**: partial rows are dropped, never repaired
//! - **No partial reads**: an I/O or encoding failure aborts the load
//! - **Strict dates**: a retained row with a malformed date aborts the load
//! - **Separation of concerns**: no aggregation logic here

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::domain::{DataColumn, NormalizedTable, SOURCE_DATE_FORMAT, TestRecord};
use crate::error::AppError;

/// Where the CSV comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Url(String),
}

impl DataSource {
    /// `http://` and `https://` values are URLs; anything else is a file path.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            DataSource::Url(raw.to_string())
        } else {
            DataSource::File(PathBuf::from(raw))
        }
    }

    fn open(&self) -> Result<Box<dyn Read>, AppError> {
        match self {
            DataSource::File(path) => {
                let file = File::open(path).map_err(|e| {
                    AppError::unavailable(format!("Failed to open CSV '{}': {e}", path.display()))
                })?;
                Ok(Box::new(file))
            }
            DataSource::Url(url) => {
                let resp = reqwest::blocking::get(url)
                    .map_err(|e| AppError::unavailable(format!("Request for '{url}' failed: {e}")))?;
                if !resp.status().is_success() {
                    return Err(AppError::unavailable(format!(
                        "Request for '{url}' failed with status {}.",
                        resp.status()
                    )));
                }
                Ok(Box::new(resp))
            }
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Logical column → index of the header it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    indices: BTreeMap<DataColumn, usize>,
}

impl ColumnMap {
    pub fn index(&self, column: DataColumn) -> usize {
        // Every DataColumn is inserted by `resolve_columns` or it fails.
        self.indices[&column]
    }
}

/// Read the full record set from `source`.
pub fn load(source: &DataSource) -> Result<NormalizedTable, AppError> {
    let reader = source.open()?;
    let table = load_from_reader(reader)?;
    let unclassified = table
        .records
        .iter()
        .filter(|r| !r.is_positive() && !r.is_suspected())
        .count();
    if unclassified > 0 {
        warn!(unclassified, "records with a diagnosis matching neither keyword");
    }
    info!(
        source = %source,
        rows_read = table.rows_read,
        rows_used = table.len(),
        rows_dropped = table.rows_dropped,
        "loaded testing records"
    );
    Ok(table)
}

/// Normalize CSV text from any reader.
pub fn load_from_reader<R: Read>(reader: R) -> Result<NormalizedTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::unavailable(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let columns = resolve_columns(&headers)?;

    let mut records = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_dropped = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: header is line 1 and CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let row = result.map_err(|e| read_error(line, &e))?;

        match parse_row(&row, &columns, line)? {
            Some(record) => records.push(record),
            None => rows_dropped += 1,
        }
    }

    Ok(NormalizedTable {
        records,
        rows_read,
        rows_dropped,
    })
}

/// A record that cannot be read at all fails the load; only rows with missing
/// fields are dropped.
fn read_error(line: usize, e: &csv::Error) -> AppError {
    match e.kind() {
        csv::ErrorKind::Utf8 { .. } => AppError::unavailable(format!(
            "Line {line}: source is not valid UTF-8 ({e}). Re-export the CSV as UTF-8."
        )),
        _ => AppError::unavailable(format!("Line {line}: failed to read source: {e}")),
    }
}

/// Locate the unique header containing each expected fragment.
pub fn resolve_columns(headers: &StringRecord) -> Result<ColumnMap, AppError> {
    let names: Vec<&str> = headers.iter().map(normalize_header_name).collect();

    let mut indices = BTreeMap::new();
    for column in DataColumn::ALL {
        let fragment = column.fragment();
        let candidates: Vec<usize> = names
            .iter()
            .enumerate()
            .filter(|(_, name)| name.contains(fragment))
            .map(|(idx, _)| idx)
            .collect();

        match candidates.as_slice() {
            [idx] => {
                debug!(
                    column = column.canonical_name(),
                    header = names[*idx],
                    "resolved column"
                );
                indices.insert(column, *idx);
            }
            [] => {
                return Err(AppError::schema(format!(
                    "No column matches `{fragment}` (for `{}`). Headers: {}",
                    column.canonical_name(),
                    names.join(", ")
                )));
            }
            many => {
                let matched: Vec<&str> = many.iter().map(|&i| names[i]).collect();
                return Err(AppError::schema(format!(
                    "Ambiguous column for `{}`: `{fragment}` matches {}",
                    column.canonical_name(),
                    matched.join(", ")
                )));
            }
        }
    }

    Ok(ColumnMap { indices })
}

fn normalize_header_name(name: &str) -> &str {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}')
}

/// `Ok(None)` means the row lacks a required field and is dropped.
fn parse_row(row: &StringRecord, columns: &ColumnMap, line: usize) -> Result<Option<TestRecord>, AppError> {
    let date = get_field(row, columns, DataColumn::Date);
    let diagnosis = get_field(row, columns, DataColumn::Diagnosis);
    let cases = get_field(row, columns, DataColumn::Cases).and_then(parse_cases);

    let (Some(date), Some(diagnosis), Some(cases)) = (date, diagnosis, cases) else {
        return Ok(None);
    };

    let date = parse_date(date)
        .map_err(|e| AppError::date_parse(format!("Line {line}: {e}")))?;

    Ok(Some(TestRecord {
        date,
        region_code: get_field(row, columns, DataColumn::RegionCode)
            .unwrap_or_default()
            .to_string(),
        region_name: get_field(row, columns, DataColumn::RegionText)
            .unwrap_or_default()
            .to_string(),
        diagnosis: diagnosis.to_string(),
        cases,
    }))
}

fn get_field<'a>(row: &'a StringRecord, columns: &ColumnMap, column: DataColumn) -> Option<&'a str> {
    row.get(columns.index(column))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_cases(s: &str) -> Option<i64> {
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    // Exports that went through a float column write counts as `12.0`.
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, SOURCE_DATE_FORMAT)
        .map_err(|e| format!("Invalid date '{s}' ({e}). Expected DD/MM/YYYY."))
}
