//! Input/output helpers.
//!
//! - CSV ingest + normalization (`ingest`)
//! - snapshot exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
