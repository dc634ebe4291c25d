// ============================================================================
// thumbnailer-core/src/pipeline/executor.rs
// ============================================================================
//
// STAGE EXECUTOR: Skip Check, Atomic Publish and Stage Outcome
//
// Runs the commands of a single stage for a single input.
//
// WORKFLOW:
// 1. A non-empty file at the stage output means the stage already ran;
//    return Skipped without invoking anything.
// 2. For each command:
//    a. If its last argument is the stage output, point it at the `_tmp`
//       sibling instead.
//    b. Run it with the model-directory and report-file environment.
//    c. On a clean exit rename the temporary file onto the output; on any
//       other exit delete the partial temporary file.
// 3. The stage failed if a command exited non-zero or the output is missing
//    at the end. Failure is logged and returned, never raised.
//
// A `CoreError` from here means the command could not be run at all or the
// filesystem refused the rename; that aborts the job, not the batch.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info, warn};

use crate::config::ThumbnailerConfig;
use crate::error::CoreResult;
use crate::external::{CommandRunner, Invocation, REPORT_VAR, model_env};
use crate::logging::RunLog;
use crate::stage::{Stage, StageOutcome, StageStatus, temp_output_path};
use crate::utils::{format_duration, is_nonempty_file};

/// Executes stages for one job.
pub struct StageExecutor<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    config: &'a ThumbnailerConfig,
    run_log: &'a RunLog,
}

impl<'a, R: CommandRunner + ?Sized> StageExecutor<'a, R> {
    pub fn new(runner: &'a R, config: &'a ThumbnailerConfig, run_log: &'a RunLog) -> Self {
        Self {
            runner,
            config,
            run_log,
        }
    }

    /// Runs `stage` for `input` unless its output is already complete.
    pub fn execute(&self, stage: &Stage, input: &Path) -> CoreResult<StageOutcome> {
        let tag = input.display();

        if is_nonempty_file(&stage.output) {
            info!(
                "[{}] Skipping {} as output exists: {}",
                tag,
                stage.name,
                stage.output.display()
            );
            return Ok(StageOutcome::skipped(stage.name));
        }

        let mut env = model_env(&self.config.model_dir);
        env.insert(
            REPORT_VAR.to_string(),
            self.run_log.report_env_value(input, stage.name),
        );

        let stage_started = Instant::now();
        let mut failure: Option<String> = None;
        let output_arg = stage.output.display().to_string();

        for (index, command) in stage.commands.iter().enumerate() {
            let step = index + 1;
            info!("[{}] Running {} step #{}", tag, stage.name, step);

            let (args, temp_path) = redirect_output(command, &output_arg, &stage.output);
            let invocation = Invocation::new(args, self.config.working_dir.clone())
                .with_env(env.clone());
            debug!("{}", invocation.display_command());

            let result = self.runner.run(&invocation)?;
            let elapsed = format_duration(result.elapsed.as_secs_f64());

            if let Some(temp_path) = temp_path {
                self.publish(&temp_path, &stage.output, result.success(), input)?;
            }

            debug!(
                "[{}] {} step #{} exited with {} after {}; output exists: {}",
                tag,
                stage.name,
                step,
                result.exit_display(),
                elapsed,
                stage.output.exists()
            );

            if !result.success() {
                warn!(
                    "[{}] Failed to process {} step #{} - exited with {} after {}",
                    tag,
                    stage.name,
                    step,
                    result.exit_display(),
                    elapsed
                );
                failure = Some(format!(
                    "step #{} exited with {}",
                    step,
                    result.exit_display()
                ));
                // Later steps consume what this one should have produced.
                break;
            }

            info!(
                "[{}] Done processing {} step #{} in {}",
                tag, stage.name, step, elapsed
            );
        }

        let elapsed = stage_started.elapsed();

        if !stage.output.exists() {
            warn!(
                "[{}] Failed to create {} (ran for {})",
                tag,
                stage.output.display(),
                format_duration(elapsed.as_secs_f64())
            );
            failure.get_or_insert_with(|| "output was not created".to_string());
        }

        let status = match failure {
            Some(reason) => StageStatus::Failed(reason),
            None => {
                info!(
                    "[{}] Done processing {} in {}",
                    tag,
                    stage.name,
                    format_duration(elapsed.as_secs_f64())
                );
                StageStatus::Succeeded
            }
        };

        Ok(StageOutcome {
            stage: stage.name,
            status,
            elapsed,
        })
    }

    /// Moves a finished temporary file into place, or discards a partial one.
    fn publish(
        &self,
        temp_path: &Path,
        output: &Path,
        succeeded: bool,
        input: &Path,
    ) -> CoreResult<()> {
        if succeeded && temp_path.exists() {
            info!(
                "[{}] Moving {} to final location",
                input.display(),
                output.display()
            );
            fs::rename(temp_path, output)?;
        } else if temp_path.exists() {
            debug!(
                "[{}] Removing partial output {}",
                input.display(),
                temp_path.display()
            );
            fs::remove_file(temp_path)?;
        }
        Ok(())
    }
}

/// Rewrites a trailing output argument to the temporary sibling path.
///
/// Returns the arguments to run and, when a substitution was made, the
/// temporary path that must be published afterwards.
fn redirect_output(
    command: &[String],
    output_arg: &str,
    output: &Path,
) -> (Vec<String>, Option<PathBuf>) {
    let mut args = command.to_vec();
    match args.last_mut() {
        Some(last) if last == output_arg => {
            let temp_path = temp_output_path(output);
            *last = temp_path.display().to_string();
            (args, Some(temp_path))
        }
        _ => (args, None),
    }
}
