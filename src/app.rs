//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and resolves settings
//! - installs the tracing subscriber
//! - dispatches to the dashboard, summary or export commands

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, ExportArgs, SummaryArgs};
use crate::config::Settings;
use crate::error::{AppError, ErrorKind};

pub mod pipeline;

/// Entry point for the `covid-tests` binary.
pub fn run() -> Result<(), AppError> {
    // `covid-tests` and `covid-tests --source x.csv` behave like `covid-tests dashboard ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Dashboard(args) => {
            let settings = Settings::from_env(args.overrides());
            init_file_logging(&settings.log_file)?;
            crate::tui::run(settings)
        }
        Command::Summary(args) => {
            init_stderr_logging();
            handle_summary(args)
        }
        Command::Export(args) => {
            init_stderr_logging();
            handle_export(args)
        }
    }
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let settings = Settings::from_env(args.source.overrides());
    let snapshot = pipeline::build_snapshot(&settings.source)?;

    println!("{}", crate::report::format_summary(&snapshot, args.top));
    if args.plot {
        println!("{}", crate::plot::render_daily_plot(&snapshot, args.width, args.height));
    }
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    if args.daily.is_none() && args.regions.is_none() && args.json.is_none() {
        return Err(AppError::new(
            ErrorKind::Usage,
            "Nothing to export: pass at least one of --daily, --regions, --json.",
        ));
    }

    let settings = Settings::from_env(args.source.overrides());
    let snapshot = pipeline::build_snapshot(&settings.source)?;

    if let Some(path) = &args.daily {
        crate::io::export::write_daily_csv(path, &snapshot)?;
        info!(path = %path.display(), "wrote daily CSV");
    }
    if let Some(path) = &args.regions {
        crate::io::export::write_regions_csv(path, &snapshot)?;
        info!(path = %path.display(), "wrote regions CSV");
    }
    if let Some(path) = &args.json {
        crate::io::export::write_snapshot_json(path, &snapshot)?;
        info!(path = %path.display(), "wrote snapshot JSON");
    }
    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// The dashboard owns the terminal, so log lines go to a file instead.
fn init_file_logging(path: &Path) -> Result<(), AppError> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::new(ErrorKind::Usage, format!("Failed to open log file '{}': {e}", path.display())))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Rewrite argv so `covid-tests` defaults to `covid-tests dashboard`.
///
/// Rules:
/// - `covid-tests`                      -> `covid-tests dashboard`
/// - `covid-tests --source x.csv ...`   -> `covid-tests dashboard --source x.csv ...`
/// - `covid-tests --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("dashboard".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    if matches!(arg1.as_str(), "dashboard" | "summary" | "export") {
        return argv;
    }

    // If the first token is a flag, treat it as "dashboard flags".
    if arg1.starts_with('-') {
        argv.insert(1, "dashboard".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_dashboard() {
        assert_eq!(rewrite_args(args(&["covid-tests"])), args(&["covid-tests", "dashboard"]));
    }

    #[test]
    fn leading_flags_go_to_dashboard() {
        assert_eq!(
            rewrite_args(args(&["covid-tests", "-s", "x.csv"])),
            args(&["covid-tests", "dashboard", "-s", "x.csv"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        assert_eq!(rewrite_args(args(&["covid-tests", "summary"])), args(&["covid-tests", "summary"]));
        assert_eq!(rewrite_args(args(&["covid-tests", "--help"])), args(&["covid-tests", "--help"]));
    }
}
