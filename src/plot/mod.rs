//! Plain-text charts for non-interactive output.

pub mod ascii;

pub use ascii::*;
