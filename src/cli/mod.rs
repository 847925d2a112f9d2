//! Command-line parsing for the testing dashboard.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! loading, aggregation and rendering.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Overrides;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "covid-tests", version, about = "COVID-19 tests in Catalonia: loader, summaries and terminal dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard (map, daily chart, auto-refresh every 2 hours).
    Dashboard(DashboardArgs),
    /// Load once and print totals, the latest day and the top regions.
    Summary(SummaryArgs),
    /// Load once and write the aggregated views to CSV/JSON.
    Export(ExportArgs),
}

/// Where to read the testing records from.
#[derive(Debug, Args, Clone, Default)]
pub struct SourceArgs {
    /// CSV path or http(s) URL (default: $COVID_TESTS_SOURCE or `rows.csv`).
    #[arg(short = 's', long)]
    pub source: Option<String>,
}

#[derive(Debug, Args, Clone, Default)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// GeoJSON with ABS boundaries (default: $COVID_TESTS_GEOJSON).
    #[arg(long, value_name = "PATH")]
    pub geojson: Option<PathBuf>,

    /// Feature property holding the ABS code (default: `ABSCodi`).
    #[arg(long, value_name = "KEY")]
    pub geo_property: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Show the top-N regions by total tests.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Also render an ASCII chart of the daily series.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Write `date,tests,positive_pct` to this CSV.
    #[arg(long, value_name = "CSV")]
    pub daily: Option<PathBuf>,

    /// Write `abs_code,abs_name,total_tests` to this CSV.
    #[arg(long, value_name = "CSV")]
    pub regions: Option<PathBuf>,

    /// Write the full snapshot to this JSON file.
    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,
}

impl SourceArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            source: self.source.clone(),
            ..Overrides::default()
        }
    }
}

impl DashboardArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            source: self.source.source.clone(),
            geojson: self.geojson.clone(),
            geo_property: self.geo_property.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_summary_flags() {
        let cli = Cli::parse_from(["covid-tests", "summary", "-s", "x.csv", "--top", "3", "--plot"]);
        let Command::Summary(args) = cli.command else {
            panic!("expected summary");
        };
        assert_eq!(args.source.source.as_deref(), Some("x.csv"));
        assert_eq!(args.top, 3);
        assert!(args.plot);
    }

    #[test]
    fn dashboard_overrides_carry_geo_settings() {
        let cli = Cli::parse_from(["covid-tests", "dashboard", "--geojson", "abs.geojson", "--geo-property", "CODI"]);
        let Command::Dashboard(args) = cli.command else {
            panic!("expected dashboard");
        };
        let o = args.overrides();
        assert_eq!(o.geojson, Some(PathBuf::from("abs.geojson")));
        assert_eq!(o.geo_property.as_deref(), Some("CODI"));
        assert_eq!(o.source, None);
    }
}
