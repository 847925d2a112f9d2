//! Reporting utilities: summaries and the "last updated" line.

pub mod format;

pub use format::*;
