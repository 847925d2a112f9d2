use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use covid_tests::app::pipeline::build_snapshot;
use covid_tests::aggregate::{daily_positive_rate, daily_tests, tests_per_region, total_tests};
use covid_tests::domain::RegionKey;
use covid_tests::error::ErrorKind;
use covid_tests::io::ingest::{DataSource, load, load_from_reader};
use tempfile::TempDir;

const HEADER: &str = "TipusCasData,ComarcaCodi,ABSCodi,ABSDescripcio,TipusCasDescripcio,NumCasos\n";

fn write_csv(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("rows.csv");
    fs::write(&path, body).unwrap();
    path
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn scenario_from_file() {
    let tmp = TempDir::new().unwrap();
    let path = write_csv(
        &tmp,
        &format!(
            "{HEADER}01/03/2020,13,R1,R1 Name,Positiu detectat,10\n01/03/2020,13,R1,R1 Name,Sospitós,5\n"
        ),
    );

    let table = load(&DataSource::File(path)).unwrap();
    assert_eq!(table.len(), 2);

    let daily = daily_tests(&table.records);
    assert_eq!(daily.get(&d(2020, 3, 1)), Some(&15));
    assert_eq!(daily.len(), 1);

    let rates = daily_positive_rate(&table.records);
    assert_eq!(rates.get(&d(2020, 3, 1)), Some(&66.67));

    let regions = tests_per_region(&table.records);
    assert_eq!(regions.get(&RegionKey::new("R1", "R1 Name")), Some(&15));
    assert_eq!(regions.len(), 1);
}

#[test]
fn row_missing_case_count_is_dropped() {
    let csv = format!(
        "{HEADER}01/03/2020,13,R1,R1 Name,Positiu,10\n02/03/2020,13,R1,R1 Name,Sospitós,\n02/03/2020,13,R2,R2 Name,Sospitós,7\n"
    );
    let table = load_from_reader(csv.as_bytes()).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows_read, 3);
    assert_eq!(table.rows_dropped, 1);
}

#[test]
fn n_well_formed_plus_m_malformed_keeps_n() {
    let mut csv = HEADER.to_string();
    for i in 0..5 {
        csv.push_str(&format!("0{}/04/2020,13,R{i},R{i} Name,Positiu,{i}\n", i + 1));
    }
    // Missing date, missing diagnosis, missing count.
    csv.push_str(",13,R9,R9 Name,Positiu,3\n");
    csv.push_str("07/04/2020,13,R9,R9 Name,,3\n");
    csv.push_str("07/04/2020,13,R9,R9 Name,Sospitós,\n");

    let table = load_from_reader(csv.as_bytes()).unwrap();
    assert_eq!(table.len(), 5);
    assert_eq!(table.rows_dropped, 3);
    assert!(table.records.iter().all(|r| !r.diagnosis.is_empty()));
}

#[test]
fn two_columns_matching_one_fragment_is_a_schema_error() {
    let csv = "TipusCasData,ABSCodi,ABSCodiAntic,ABSDescripcio,TipusCasDescripcio,NumCasos\n\
               01/03/2020,R1,R0,R1 Name,Positiu,1\n";
    let err = load_from_reader(csv.as_bytes()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaResolution);
    assert!(err.to_string().contains("ABSCodiAntic"));
}

#[test]
fn iso_date_on_retained_row_fails() {
    let csv = format!("{HEADER}2020-03-01,13,R1,R1 Name,Positiu,1\n");
    let err = load_from_reader(csv.as_bytes()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DateParse);
    assert!(err.to_string().contains("Line 2"));
}

#[test]
fn missing_file_is_source_unavailable() {
    let tmp = TempDir::new().unwrap();
    let err = load(&DataSource::File(tmp.path().join("nope.csv"))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
}

#[test]
fn conservation_holds_on_loaded_table() {
    let csv = format!(
        "{HEADER}01/03/2020,13,R1,R1 Name,Positiu,4\n\
         01/03/2020,13,R2,R2 Name,Sospitós,6\n\
         02/03/2020,13,R1,R1 Name,Sospitós,0\n\
         03/03/2020,13,R2,R2 Name,Positiu,-2\n\
         03/03/2020,13,R2,R2 Name,Positiu,9\n"
    );
    let table = load_from_reader(csv.as_bytes()).unwrap();
    let total = total_tests(&table.records);

    assert_eq!(daily_tests(&table.records).values().sum::<i64>(), total);
    assert_eq!(tests_per_region(&table.records).values().sum::<i64>(), total);

    let rates = daily_positive_rate(&table.records);
    assert_eq!(rates[&d(2020, 3, 2)], 0.0);
    for rate in rates.values() {
        assert!((0.0..=100.0).contains(rate));
    }
}

#[test]
fn pipeline_builds_a_complete_snapshot() {
    let tmp = TempDir::new().unwrap();
    let path = write_csv(
        &tmp,
        &format!(
            "{HEADER}01/03/2020,13,R1,R1 Name,Positiu,10\n01/03/2020,13,R1,R1 Name,Sospitós,5\n02/03/2020,13,R2,R2 Name,Sospitós,\n"
        ),
    );

    let snap = build_snapshot(&DataSource::File(path.clone())).unwrap();
    assert_eq!(snap.source, path.display().to_string());
    assert_eq!(snap.rows_read, 3);
    assert_eq!(snap.rows_used, 2);
    assert_eq!(snap.rows_dropped, 1);
    assert_eq!(snap.total_tests, 15);
    assert_eq!(snap.daily_positivity[&d(2020, 3, 1)], 66.67);
    assert_eq!(snap.date_span(), Some((d(2020, 3, 1), d(2020, 3, 1))));
}
