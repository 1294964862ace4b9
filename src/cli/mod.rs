//! Command line interface module.
//!
//! Provides argument parsing and output formatting.

pub mod args;
pub mod output;
