// ============================================================================
// thumbnailer-core/src/pipeline/mod.rs
// ============================================================================
//
// JOB PIPELINE: The Fixed Stage Sequence for One Input
//
// A job runs stabilize, preview and proxy for one input file, in that
// order, on the worker thread that picked it up. Stages are independent
// transforms of the same source: a failed stage is recorded and the next
// one still runs, each honouring its own skip check.
//
// The stabilize stage needs a transient parameters file shared by its two
// passes. It lives in the system temp directory and is deleted when the
// stage finishes, whichever way it finishes.

use std::path::{self, Path};

use log::info;
use tempfile::{Builder as TempFileBuilder, NamedTempFile};

use crate::config::ThumbnailerConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::CommandRunner;
use crate::logging::RunLog;
use crate::stage::StageOutcome;

/// Runs the commands of a single stage
pub mod executor;

/// Declarative command construction for each stage
pub mod stages;

pub use executor::StageExecutor;
pub use stages::StagePaths;

/// The per-input stage sequence.
pub struct JobPipeline<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    config: &'a ThumbnailerConfig,
    run_log: &'a RunLog,
}

impl<'a, R: CommandRunner + ?Sized> JobPipeline<'a, R> {
    pub fn new(runner: &'a R, config: &'a ThumbnailerConfig, run_log: &'a RunLog) -> Self {
        Self {
            runner,
            config,
            run_log,
        }
    }

    /// Runs all three stages for `input` and returns their outcomes in order.
    ///
    /// Stage failures are part of the returned outcomes. `Err` means the job
    /// itself could not proceed (missing input, spawn failure, I/O error).
    pub fn run(&self, input: &Path) -> CoreResult<Vec<StageOutcome>> {
        if !input.is_file() {
            return Err(CoreError::InputNotFound(input.to_path_buf()));
        }
        let input = path::absolute(input)?;
        let lut = path::absolute(&self.config.lut)?;

        info!("[{}] Starting", input.display());

        let executor = StageExecutor::new(self.runner, self.config, self.run_log);
        let paths = StagePaths {
            transcoder: &self.config.transcoder,
            input: &input,
            lut: &lut,
        };

        let mut outcomes = Vec::with_capacity(3);

        {
            let transient = create_transient(&input)?;
            let stage = stages::stabilize(&paths, transient.path());
            outcomes.push(executor.execute(&stage, &input)?);
        }
        outcomes.push(executor.execute(&stages::preview(&paths), &input)?);
        outcomes.push(executor.execute(&stages::proxy(&paths), &input)?);

        info!("[{}] Done", input.display());
        Ok(outcomes)
    }
}

/// Creates the stabilization parameters file, removed when dropped.
fn create_transient(input: &Path) -> CoreResult<NamedTempFile> {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    TempFileBuilder::new()
        .prefix("thumbnailer_")
        .suffix(&format!("{name}_stab.json"))
        .tempfile()
        .map_err(|source| CoreError::TempFile {
            path: input.to_path_buf(),
            source,
        })
}
