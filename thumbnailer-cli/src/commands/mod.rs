//! Command implementations for the CLI.

/// Runs one batch over the given inputs and logs the summary.
pub mod process;
