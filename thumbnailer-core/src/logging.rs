//! Run log handle.
//!
//! Messages themselves go through the `log` facade; whichever logger the
//! binary installs is the process-wide sink. `RunLog` carries the per-run
//! state the engine needs on top of that: the directory that receives one
//! transcoder report per (input, stage) pair and the report verbosity. It is
//! created once at startup and passed by reference to every pipeline.

use std::path::{Path, PathBuf};

use crate::external::report_spec;
use crate::stage::StageName;

/// File name of the aggregate program log inside the run directory.
pub const RUN_LOG_FILE: &str = "thumbnailer.log";

#[derive(Debug, Clone)]
pub struct RunLog {
    dir: PathBuf,
    report_level: u8,
}

impl RunLog {
    pub fn new(dir: impl Into<PathBuf>, report_level: u8) -> Self {
        Self {
            dir: dir.into(),
            report_level,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the aggregate program log.
    pub fn program_log(&self) -> PathBuf {
        self.dir.join(RUN_LOG_FILE)
    }

    /// Report file for one stage of one input: `<input file name>-<stage>.log`.
    pub fn stage_report(&self, input: &Path, stage: StageName) -> PathBuf {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());
        self.dir.join(format!("{name}-{stage}.log"))
    }

    /// Value for the transcoder's report variable for this stage.
    pub fn report_env_value(&self, input: &Path, stage: StageName) -> String {
        report_spec(&self.stage_report(input, stage), self.report_level)
    }
}
