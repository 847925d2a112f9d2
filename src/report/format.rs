//! Formatted terminal output.
//!
//! Formatting lives here so the aggregation code stays free of presentation
//! concerns and output changes are localized.

use chrono::{DateTime, Duration, Utc};

use crate::snapshot::Snapshot;

/// Hours east of UTC used for the "last updated" line (CEST).
const DISPLAY_OFFSET_HOURS: i64 = 2;

/// `Darrera actualització: 2020-03-01 12:00:00, CEST (UTC+2)`
pub fn last_update_text(loaded_at: DateTime<Utc>) -> String {
    let local = loaded_at.naive_utc() + Duration::hours(DISPLAY_OFFSET_HOURS);
    format!(
        "Darrera actualització: {}, CEST (UTC+{DISPLAY_OFFSET_HOURS})",
        local.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Human-readable summary of a snapshot with the top-N regions.
pub fn format_summary(snapshot: &Snapshot, top_n: usize) -> String {
    let mut out = String::new();

    out.push_str("=== COVID-19 tests realitzats a Catalunya ===\n");
    out.push_str(&last_update_text(snapshot.loaded_at));
    out.push('\n');
    out.push_str(&format!("Source: {}\n", snapshot.source));
    out.push_str(&format!(
        "Rows: read={} used={} dropped={}\n",
        snapshot.rows_read, snapshot.rows_used, snapshot.rows_dropped
    ));
    out.push_str(&format!("Total tests: {}\n", snapshot.total_tests));

    match snapshot.date_span() {
        Some((first, last)) => {
            out.push_str(&format!(
                "Dates: {first} → {last} ({} days with data)\n",
                snapshot.daily_tests.len()
            ));
            let tests = snapshot.daily_tests.get(&last).copied().unwrap_or(0);
            let pct = snapshot.daily_positivity.get(&last).copied().unwrap_or(0.0);
            out.push_str(&format!("Latest day: {last} | tests={tests} | positius={pct:.2}%\n"));
        }
        None => out.push_str("Dates: -\n"),
    }

    let ranked = snapshot.ranked_regions();
    if !ranked.is_empty() {
        out.push_str(&format!("\nTop {} ABS by tests:\n", top_n.min(ranked.len())));
        out.push_str(&format!("{:>4}  {:<8} {:<40} {:>10}\n", "#", "ABSCodi", "ABSDescripcio", "Tests"));
        for (i, (region, total)) in ranked.iter().take(top_n).enumerate() {
            out.push_str(&format!(
                "{:>4}  {:<8} {:<40} {:>10}\n",
                i + 1,
                region.code,
                truncate(&region.name, 40),
                total
            ));
        }
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NormalizedTable, TestRecord};
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn last_update_is_shown_in_utc_plus_two() {
        let t = Utc.with_ymd_and_hms(2020, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(
            last_update_text(t),
            "Darrera actualització: 2020-03-01 12:00:00, CEST (UTC+2)"
        );
    }

    #[test]
    fn summary_lists_top_regions() {
        let date = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let records = ["A", "B", "C"]
            .iter()
            .enumerate()
            .map(|(i, code)| TestRecord {
                date,
                region_code: code.to_string(),
                region_name: format!("ABS {code}"),
                diagnosis: "Positiu".to_string(),
                cases: (i as i64 + 1) * 10,
            })
            .collect();
        let snap = Snapshot::from_table(&NormalizedTable::new(records), "rows.csv", Utc::now());

        let text = format_summary(&snap, 2);
        assert!(text.contains("Total tests: 60"));
        assert!(text.contains("Top 2 ABS"));
        assert!(text.contains("ABS C"));
        assert!(!text.contains("ABS A"));
    }

    #[test]
    fn truncates_long_names() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
