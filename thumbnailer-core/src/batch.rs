// ============================================================================
// thumbnailer-core/src/batch.rs
// ============================================================================
//
// BATCH ORCHESTRATION: Bounded Worker Pool Across All Inputs
//
// WORKFLOW:
// 1. Build a worker pool of `max_concurrency` threads.
// 2. For each top-level argument, expand it into candidate inputs and
//    submit one job per candidate.
// 3. Wait for every job. A job's error or panic is logged with its input
//    path and recorded in its report; it never stops sibling jobs.
//
// Jobs share nothing mutable: the config, run log and runner are read-only
// references, and the report list is the only lock.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use log::{error, info, warn};

use crate::config::ThumbnailerConfig;
use crate::discovery::{GlobMatcher, expand_input, is_job_candidate};
use crate::error::{CoreError, CoreResult};
use crate::external::CommandRunner;
use crate::logging::RunLog;
use crate::pipeline::JobPipeline;
use crate::stage::{StageOutcome, StageStatus};

/// Result of one job.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub input: PathBuf,
    /// Stage outcomes, or the message of the error that ended the job
    pub outcome: Result<Vec<StageOutcome>, String>,
}

impl JobReport {
    /// True when the job errored or any of its stages failed.
    pub fn has_failures(&self) -> bool {
        match &self.outcome {
            Ok(outcomes) => outcomes.iter().any(StageOutcome::is_failed),
            Err(_) => true,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match &self.outcome {
            Ok(outcomes) => outcomes.iter().map(|o| o.elapsed).sum(),
            Err(_) => Duration::ZERO,
        }
    }
}

/// Stage tallies across a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub skipped: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Everything a batch run produced, sorted by input path.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub jobs: Vec<JobReport>,
}

impl BatchReport {
    /// Jobs that ended with an error instead of stage outcomes.
    pub fn errored_jobs(&self) -> usize {
        self.jobs.iter().filter(|j| j.outcome.is_err()).count()
    }

    /// Jobs with an error or at least one failed stage.
    pub fn failed_jobs(&self) -> usize {
        self.jobs.iter().filter(|j| j.has_failures()).count()
    }

    pub fn stage_counts(&self) -> StageCounts {
        let mut counts = StageCounts::default();
        for outcome in self.jobs.iter().filter_map(|j| j.outcome.as_ref().ok()).flatten() {
            match outcome.status {
                StageStatus::Skipped => counts.skipped += 1,
                StageStatus::Succeeded => counts.succeeded += 1,
                StageStatus::Failed(_) => counts.failed += 1,
            }
        }
        counts
    }
}

/// Runs one job pipeline per discovered input on a bounded pool.
pub struct Batch<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    config: &'a ThumbnailerConfig,
    run_log: &'a RunLog,
}

impl<'a, R: CommandRunner + ?Sized> Batch<'a, R> {
    pub fn new(runner: &'a R, config: &'a ThumbnailerConfig, run_log: &'a RunLog) -> Self {
        Self {
            runner,
            config,
            run_log,
        }
    }

    /// Processes every input and returns once all jobs have finished.
    ///
    /// Fails only if the glob is invalid or the pool cannot be built.
    pub fn run<P: AsRef<Path> + Sync>(&self, inputs: &[P]) -> CoreResult<BatchReport> {
        let matcher = GlobMatcher::new(&self.config.input_glob)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_concurrency)
            .thread_name(|i| format!("thumbnailer-job-{i}"))
            .build()
            .map_err(|e| CoreError::ThreadPool(e.to_string()))?;

        info!(
            "Processing {} input argument(s) with {} worker(s)",
            inputs.len(),
            self.config.max_concurrency
        );

        let reports = Mutex::new(Vec::new());

        pool.scope(|scope| {
            for arg in inputs {
                let arg = arg.as_ref();
                let paths = match expand_input(arg, &matcher) {
                    Ok(paths) => paths,
                    Err(e) => {
                        error!("Failed to scan {}: {}", arg.display(), e);
                        continue;
                    }
                };
                if arg.is_dir() {
                    info!(
                        "Found {} file(s) matching '{}' under {}",
                        paths.len(),
                        matcher.pattern(),
                        arg.display()
                    );
                }

                for path in paths.into_iter().filter(|p| is_job_candidate(p)) {
                    let reports = &reports;
                    scope.spawn(move |_| {
                        let report = self.run_job(path);
                        reports
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .push(report);
                    });
                }
            }
        });

        let mut jobs = reports
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        jobs.sort_by(|a, b| a.input.cmp(&b.input));
        Ok(BatchReport { jobs })
    }

    /// Runs one pipeline, turning any error or panic into a report entry.
    fn run_job(&self, input: PathBuf) -> JobReport {
        let pipeline = JobPipeline::new(self.runner, self.config, self.run_log);
        let result = panic::catch_unwind(AssertUnwindSafe(|| pipeline.run(&input)));

        let outcome = match result {
            Ok(Ok(outcomes)) => {
                if outcomes.iter().any(StageOutcome::is_failed) {
                    warn!("[{}] Finished with failed stages", input.display());
                }
                Ok(outcomes)
            }
            Ok(Err(e)) => {
                error!("[{}] Failed to process: {}", input.display(), e);
                Err(e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("[{}] Failed to process: job panicked: {}", input.display(), message);
                Err(format!("job panicked: {message}"))
            }
        };

        JobReport { input, outcome }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
