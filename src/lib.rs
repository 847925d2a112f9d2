//! `covid-tests` library crate.
//!
//! The binary is a thin wrapper around this library so that:
//!
//! - loading and aggregation are testable without spawning processes
//! - the same snapshot pipeline serves the dashboard and the one-shot commands

pub mod aggregate;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod geo;
pub mod io;
pub mod plot;
pub mod report;
pub mod snapshot;
pub mod tui;
