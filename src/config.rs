//! Runtime settings.
//!
//! Values resolve in order: CLI flag, environment (a `.env` file is honored),
//! then the built-in default.

use std::path::PathBuf;
use std::time::Duration;

use crate::io::ingest::DataSource;

pub const ENV_SOURCE: &str = "COVID_TESTS_SOURCE";
pub const ENV_GEOJSON: &str = "COVID_TESTS_GEOJSON";
pub const ENV_GEO_PROPERTY: &str = "COVID_TESTS_GEO_PROPERTY";
pub const ENV_LOG: &str = "COVID_TESTS_LOG";

pub const DEFAULT_SOURCE: &str = "rows.csv";
pub const DEFAULT_GEO_PROPERTY: &str = "ABSCodi";
pub const DEFAULT_LOG_FILE: &str = "covid-tests.log";

/// How often the dashboard reloads the source.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub source: DataSource,
    pub geojson: Option<PathBuf>,
    pub geo_property: String,
    pub log_file: PathBuf,
}

/// Optional overrides coming from the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source: Option<String>,
    pub geojson: Option<PathBuf>,
    pub geo_property: Option<String>,
}

impl Settings {
    pub fn from_env(overrides: Overrides) -> Self {
        dotenvy::dotenv().ok();
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary environment lookup.
    pub fn resolve(overrides: Overrides, env: impl Fn(&str) -> Option<String>) -> Self {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let source = overrides
            .source
            .or_else(|| env(ENV_SOURCE))
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string());

        Self {
            source: DataSource::parse(&source),
            geojson: overrides.geojson.or_else(|| env(ENV_GEOJSON).map(PathBuf::from)),
            geo_property: overrides
                .geo_property
                .or_else(|| env(ENV_GEO_PROPERTY))
                .unwrap_or_else(|| DEFAULT_GEO_PROPERTY.to_string()),
            log_file: env(ENV_LOG)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_env_or_flags() {
        let s = Settings::resolve(Overrides::default(), lookup(&[]));
        assert_eq!(s.source, DataSource::File(PathBuf::from(DEFAULT_SOURCE)));
        assert_eq!(s.geojson, None);
        assert_eq!(s.geo_property, DEFAULT_GEO_PROPERTY);
        assert_eq!(s.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn flags_win_over_env() {
        let env = lookup(&[(ENV_SOURCE, "https://example.org/rows.csv"), (ENV_GEOJSON, "abs.geojson")]);
        let overrides = Overrides {
            source: Some("local.csv".to_string()),
            ..Overrides::default()
        };
        let s = Settings::resolve(overrides, env);
        assert_eq!(s.source, DataSource::File(PathBuf::from("local.csv")));
        assert_eq!(s.geojson, Some(PathBuf::from("abs.geojson")));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let s = Settings::resolve(Overrides::default(), lookup(&[(ENV_SOURCE, "  ")]));
        assert_eq!(s.source, DataSource::File(PathBuf::from(DEFAULT_SOURCE)));
    }
}
