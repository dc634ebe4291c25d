// ============================================================================
// thumbnailer-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Invocation of the External Transcoder
//
// This module encapsulates the one interaction the engine has with the
// outside world: running the transcoder with a list of arguments, a working
// directory and extra environment variables, and reporting how it exited.
//
// KEY COMPONENTS:
// - Invocation / InvocationResult: plain descriptions of a run and its result
// - CommandRunner: trait seam so pipelines can be driven by a fake in tests
// - ProcessRunner: production implementation backed by std::process
// - Environment helpers for the model-directory and report-file variables
//
// DESIGN PHILOSOPHY:
// Arguments are passed verbatim with no shell in between. The runner never
// interprets them; deciding what a non-zero exit means is the stage
// executor's job.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreResult;

// ============================================================================
// SUBMODULES
// ============================================================================

/// Contains the std::process backed runner
pub mod process_runner;

pub use process_runner::ProcessRunner;

// ============================================================================
// ENVIRONMENT CONTRACT
// ============================================================================

/// Points the transcoder at its model files.
pub const MODEL_DIR_VAR: &str = "TVAI_MODEL_DIR";

/// Points the transcoder at its model data files.
pub const MODEL_DATA_DIR_VAR: &str = "TVAI_MODEL_DATA_DIR";

/// Per-invocation report file specification.
pub const REPORT_VAR: &str = "FFREPORT";

// ============================================================================
// INVOCATION TYPES
// ============================================================================

/// A single external command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program followed by its arguments
    pub args: Vec<String>,
    /// Directory the command runs in
    pub working_dir: PathBuf,
    /// Variables overlaid on the inherited environment
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    pub fn new(args: Vec<String>, working_dir: PathBuf) -> Self {
        Self {
            args,
            working_dir,
            env: BTreeMap::new(),
        }
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Program name used in log messages and errors.
    pub fn program(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or("")
    }

    /// Shell-quoted rendering of the command line, for logs only.
    pub fn display_command(&self) -> String {
        format_command(&self.args)
    }
}

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationResult {
    /// Exit code, or `None` when the process was ended by a signal
    pub exit_code: Option<i32>,
    /// Wall-clock time from spawn to exit
    pub elapsed: Duration,
    /// Whether the runner killed the process after its timeout
    pub timed_out: bool,
}

impl InvocationResult {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Exit code as shown in logs (`signal` when there is none).
    pub fn exit_display(&self) -> String {
        match (self.timed_out, self.exit_code) {
            (true, _) => "timeout".to_string(),
            (false, Some(code)) => code.to_string(),
            (false, None) => "signal".to_string(),
        }
    }
}

// ============================================================================
// RUNNER TRAIT
// ============================================================================

/// Something that can run an [`Invocation`] to completion.
///
/// Implementations block the calling thread until the command exits. They
/// must be shareable across the worker pool.
pub trait CommandRunner: Send + Sync {
    /// Runs the command and reports how it exited.
    ///
    /// Returns `Err` only when the command could not be started or waited
    /// on; a non-zero exit is a normal `Ok` result.
    fn run(&self, invocation: &Invocation) -> CoreResult<InvocationResult>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> CoreResult<InvocationResult> {
        (**self).run(invocation)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Environment variables locating the transcoder's model data.
pub fn model_env(model_dir: &std::path::Path) -> BTreeMap<String, String> {
    let dir = model_dir.display().to_string();
    BTreeMap::from([
        (MODEL_DIR_VAR.to_string(), dir.clone()),
        (MODEL_DATA_DIR_VAR.to_string(), dir),
    ])
}

/// Value of the report variable for a given log file and verbosity.
pub fn report_spec(log_file: &std::path::Path, level: u8) -> String {
    format!("file='{}':level={}", log_file.display(), level)
}

/// Joins arguments into a single line, quoting those a shell would split.
pub fn format_command(args: &[String]) -> String {
    args.iter()
        .map(|arg| quote_arg(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_arg(arg: &str) -> String {
    let is_plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if is_plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r#"'"'"'"#))
    }
}
