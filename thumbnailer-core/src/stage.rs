//! Stage data model and output naming.
//!
//! A stage is one named transformation of an input file into one output
//! file. Output names are derived from the input name by inserting a
//! stage-specific suffix, and every suffix carries a marker that discovery
//! uses to recognise (and skip) derived files.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Substrings that identify a file as output of this tool.
pub const DERIVED_OUTPUT_MARKERS: [&str; 2] = ["thumbnailer", "_Proxy"];

/// Suffix appended to an output's stem while it is being written.
pub const TEMP_SUFFIX: &str = "_tmp";

/// The fixed stages of a job, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageName {
    Stabilize,
    Preview,
    Proxy,
}

impl StageName {
    pub const ALL: [StageName; 3] = [StageName::Stabilize, StageName::Preview, StageName::Proxy];

    pub fn as_str(self) -> &'static str {
        match self {
            StageName::Stabilize => "stabilize",
            StageName::Preview => "preview",
            StageName::Proxy => "proxy",
        }
    }

    /// Suffix inserted into the input file name to form this stage's output.
    pub fn output_suffix(self) -> &'static str {
        match self {
            StageName::Stabilize => "_thumbnailer_stab",
            StageName::Preview => "_thumbnailer_preview",
            StageName::Proxy => "_Proxy",
        }
    }

    /// Output path of this stage for `input`.
    pub fn output_path(self, input: &Path) -> PathBuf {
        derived_path(input, self.output_suffix())
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved stage: its output and the commands that produce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: StageName,
    pub output: PathBuf,
    /// Argument vectors run in order; each starts with the program.
    pub commands: Vec<Vec<String>>,
}

/// How a stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    /// Output already existed and was non-empty; nothing ran.
    Skipped,
    Succeeded,
    Failed(String),
}

/// Result of executing one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub stage: StageName,
    pub status: StageStatus,
    pub elapsed: Duration,
}

impl StageOutcome {
    pub fn skipped(stage: StageName) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped,
            elapsed: Duration::ZERO,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, StageStatus::Failed(_))
    }
}

/// Inserts `suffix` before the first `.` of the file name.
///
/// `clip.mp4` becomes `clip<suffix>.mp4`; a name without a dot gets the
/// suffix appended.
pub fn derived_path(input: &Path, suffix: &str) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let derived = match name.find('.') {
        Some(dot) => format!("{}{}{}", &name[..dot], suffix, &name[dot..]),
        None => format!("{name}{suffix}"),
    };
    input.with_file_name(derived)
}

/// Sibling path an output is written to before being renamed into place.
///
/// Keeps the directory and extension: `out.mp4` becomes `out_tmp.mp4`.
pub fn temp_output_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{stem}{TEMP_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{TEMP_SUFFIX}"),
    };
    output.with_file_name(name)
}

/// Whether the file name carries one of the derived-output markers.
pub fn is_derived_output(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .is_some_and(|name| DERIVED_OUTPUT_MARKERS.iter().any(|m| name.contains(m)))
}
