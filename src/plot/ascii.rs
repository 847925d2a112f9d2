//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal or a cron log
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - daily tests: `o` (left scale, padded to the observed range)
//! - daily positivity: `+` (right scale, fixed 0–100 %)

use chrono::NaiveDate;

use crate::snapshot::Snapshot;

/// Render the daily dual-scale chart for a snapshot.
pub fn render_daily_plot(snapshot: &Snapshot, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((first, last)) = snapshot.date_span() else {
        return "Plot: no data\n".to_string();
    };

    let tests: Vec<(f64, f64)> = snapshot
        .daily_tests
        .iter()
        .map(|(d, v)| (day_offset(first, *d), *v as f64))
        .collect();
    let positivity: Vec<(f64, f64)> = snapshot
        .daily_positivity
        .iter()
        .map(|(d, v)| (day_offset(first, *d), *v))
        .collect();

    let (x_min, x_max) = x_range(day_offset(first, last));
    let (y_min, y_max) = y_range(&tests).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Positivity first so test markers win on overlap.
    for &(x, pct) in &positivity {
        grid[map_y(pct, 0.0, 100.0, height)][map_x(x, x_min, x_max, width)] = '+';
    }
    for &(x, y) in &tests {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: dates=[{first}, {last}] | tests=[{y_min:.0}, {y_max:.0}] | positius=[0, 100]%\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn day_offset(first: NaiveDate, d: NaiveDate) -> f64 {
    (d - first).num_days() as f64
}

fn x_range(span_days: f64) -> (f64, f64) {
    if span_days > 0.0 {
        (0.0, span_days)
    } else {
        // A single date sits in the middle.
        (-1.0, 1.0)
    }
}

fn y_range(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in points {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if !(min_y.is_finite() && max_y.is_finite()) {
        return None;
    }
    if max_y > min_y {
        Some((min_y, max_y))
    } else {
        Some((min_y - 1.0, max_y + 1.0))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn snapshot(days: &[(u32, i64, f64)]) -> Snapshot {
        let d = |day| NaiveDate::from_ymd_opt(2020, 3, day).unwrap();
        Snapshot {
            loaded_at: Utc.with_ymd_and_hms(2020, 3, 4, 0, 0, 0).unwrap(),
            source: "rows.csv".to_string(),
            rows_read: 0,
            rows_used: 0,
            rows_dropped: 0,
            total_tests: days.iter().map(|(_, t, _)| t).sum(),
            daily_tests: days.iter().map(|&(day, t, _)| (d(day), t)).collect(),
            daily_positivity: days.iter().map(|&(day, _, p)| (d(day), p)).collect(),
            regional: Default::default(),
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let snap = snapshot(&[(1, 100, 50.0), (3, 200, 25.0)]);
        let txt = render_daily_plot(&snap, 10, 5);
        let expected = concat!(
            "Plot: dates=[2020-03-01, 2020-03-03] | tests=[95, 205] | positius=[0, 100]%\n",
            "         o\n",
            "          \n",
            "+         \n",
            "         +\n",
            "o         \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_snapshot_renders_placeholder() {
        let snap = snapshot(&[]);
        assert_eq!(render_daily_plot(&snap, 20, 8), "Plot: no data\n");
    }

    #[test]
    fn single_day_is_centered() {
        let snap = snapshot(&[(1, 10, 0.0)]);
        let txt = render_daily_plot(&snap, 11, 5);
        let rows: Vec<&str> = txt.lines().skip(1).collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows.iter().filter(|r| r.contains('o')).count(), 1);
        assert!(rows.iter().any(|r| r.find('o') == Some(5)));
    }
}
