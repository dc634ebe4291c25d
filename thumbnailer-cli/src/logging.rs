// ============================================================================
// thumbnailer-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console + Run Log File
//
// The core library only emits `log` records. This module installs the
// process-wide `fern` dispatcher: info and above go to the console, debug
// and above go to `<run dir>/thumbnailer.log`. Worker threads log
// concurrently; fern writes each record as one line under a lock.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::LevelFilter;

/// Log base used when neither `--log-dir` nor `THUMBNAILER_LOG_DIR` is set.
pub const DEFAULT_LOG_BASE: &str = "thumbnailer-logs";

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Creates `<base>/<timestamp>` and returns it as an absolute path.
///
/// The transcoder runs from its own directory, so the report paths handed to
/// it must not depend on the current directory.
pub fn create_run_dir(base: Option<&Path>) -> Result<PathBuf> {
    let base = base.map_or_else(|| PathBuf::from(DEFAULT_LOG_BASE), Path::to_path_buf);
    let base = std::path::absolute(&base)
        .with_context(|| format!("Invalid log directory '{}'", base.display()))?;
    let run_dir = base.join(get_timestamp());
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create log directory '{}'", run_dir.display()))?;
    Ok(run_dir)
}

/// Installs the global logger writing to `log_path`. Can only succeed once
/// per process.
pub fn init_logging(log_path: &Path) -> Result<()> {
    let log_file = fern::log_file(log_path)
        .with_context(|| format!("Failed to open log file '{}'", log_path.display()))?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} - {} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(LevelFilter::Debug)
        .chain(
            fern::Dispatch::new()
                .level(LevelFilter::Info)
                .chain(std::io::stdout()),
        )
        .chain(fern::Dispatch::new().level(LevelFilter::Debug).chain(log_file))
        .apply()
        .context("Failed to initialize logging")?;

    Ok(())
}
