//! Configuration structures and constants for the thumbnailer-core library.
//!
//! This module holds everything a batch run needs to know that is not an
//! input path: where the transcoder lives, which LUT to grade with, where
//! per-stage logs go and how many jobs may run at once.

mod builder;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CoreError, CoreResult};

pub use builder::ThumbnailerConfigBuilder;

// Default constants

/// Installation root of the bundled transcoder.
pub const DEFAULT_TRANSCODER_ROOT: &str = "/Applications/Topaz Video AI.app";

/// Transcoder executable, relative to [`DEFAULT_TRANSCODER_ROOT`].
pub const DEFAULT_TRANSCODER_BIN: &str = "Contents/MacOS/ffmpeg";

/// Model data directory, relative to [`DEFAULT_TRANSCODER_ROOT`].
pub const DEFAULT_MODEL_DIR: &str = "Contents/Resources/models";

/// Glob applied recursively when an input argument is a directory.
pub const DEFAULT_INPUT_GLOB: &str = "*.MP4";

/// Number of jobs run at once.
/// Hardware encoders lose throughput when oversubscribed, so this stays low.
pub const DEFAULT_MAX_CONCURRENCY: usize = 2;

/// Verbosity of the transcoder's own report file (32 is INFO).
pub const DEFAULT_REPORT_LEVEL: u8 = 32;

/// Main configuration structure for a batch run.
///
/// Created by the CLI (usually through [`ThumbnailerConfigBuilder`]) and
/// shared read-only by every job of the run.
#[derive(Debug, Clone)]
pub struct ThumbnailerConfig {
    /// Transcoder executable invoked for every stage command
    pub transcoder: PathBuf,

    /// Directory holding the transcoder's model data
    pub model_dir: PathBuf,

    /// Working directory for spawned commands
    pub working_dir: PathBuf,

    /// 3D LUT used by the colour-graded stages
    pub lut: PathBuf,

    /// Per-run directory receiving the per-stage report files
    pub run_log_dir: PathBuf,

    /// Glob used when expanding directory inputs (case-sensitive)
    pub input_glob: String,

    /// Size of the worker pool
    pub max_concurrency: usize,

    /// Transcoder report verbosity
    pub report_level: u8,

    /// Optional limit on a single command's runtime
    pub timeout: Option<Duration>,
}

impl ThumbnailerConfig {
    /// Creates a configuration with default transcoder settings.
    pub fn new(lut: PathBuf, run_log_dir: PathBuf) -> Self {
        let root = Path::new(DEFAULT_TRANSCODER_ROOT);
        let transcoder = root.join(DEFAULT_TRANSCODER_BIN);
        let working_dir = default_working_dir(&transcoder);
        Self {
            transcoder,
            model_dir: root.join(DEFAULT_MODEL_DIR),
            working_dir,
            lut,
            run_log_dir,
            input_glob: DEFAULT_INPUT_GLOB.to_string(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            report_level: DEFAULT_REPORT_LEVEL,
            timeout: None,
        }
    }

    /// Checks the settings that would otherwise fail halfway through a run.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_concurrency == 0 {
            return Err(CoreError::Config(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.input_glob.trim().is_empty() {
            return Err(CoreError::Config("input glob must not be empty".to_string()));
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(CoreError::Config("timeout must be greater than zero".to_string()));
        }
        if self.transcoder.as_os_str().is_empty() {
            return Err(CoreError::Config("transcoder path must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Commands run from the transcoder's own directory so it finds its libraries.
pub(crate) fn default_working_dir(transcoder: &Path) -> PathBuf {
    transcoder
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
