// ============================================================================
// thumbnailer-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Custom Error Types for Thumbnailer Core
//
// This module defines the error types used throughout the thumbnailer-core
// library. Stage-level failures (non-zero exit, missing output) are NOT
// errors: they are reported through `StageStatus::Failed`. A `CoreError`
// aborts the job it occurred in, or the whole run when raised at startup.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the thumbnailer job engine.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed to wait for command '{0}': {1}")]
    CommandWait(String, #[source] io::Error),

    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Invalid input glob '{0}': {1}")]
    InvalidGlob(String, String),

    #[error("Failed to walk directory: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("Failed to create transient file for {}: {source}", .path.display())]
    TempFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for thumbnailer-core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Builds a `CommandStart` error for the given program.
pub fn command_start_error(program: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(program.into(), err)
}

/// Builds a `CommandWait` error for the given program.
pub fn command_wait_error(program: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(program.into(), err)
}
