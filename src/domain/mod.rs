//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the source column schema (`DataColumn`)
//! - normalized test records (`TestRecord`, `NormalizedTable`)
//! - aggregated views (`DailySummary`, `DailyPositivity`, `RegionalSummary`)

pub mod types;

pub use types::*;
