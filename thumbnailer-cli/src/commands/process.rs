//! Implementation of the batch run.
//!
//! Bootstraps the run directory and logger, turns the arguments into a
//! `ThumbnailerConfig`, hands every input to `thumbnailer_core::Batch`, and
//! logs a summary. Failed jobs are reported but do not change the exit status.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};

use thumbnailer_core::{
    Batch, BatchReport, ProcessRunner, RunLog, ThumbnailerConfig, ThumbnailerConfigBuilder,
    format_duration,
};

use crate::cli::Cli;
use crate::logging::{create_run_dir, init_logging};

/// Resolves the LUT against the current directory and checks it exists.
fn resolve_lut(lut: &Path) -> Result<PathBuf> {
    let lut = std::path::absolute(lut)
        .with_context(|| format!("Invalid LUT path '{}'", lut.display()))?;
    if !lut.is_file() {
        bail!("LUT file '{}' does not exist", lut.display());
    }
    Ok(lut)
}

/// Creates the core configuration from the parsed arguments.
fn create_config(cli: &Cli, lut: PathBuf, run_dir: PathBuf) -> Result<ThumbnailerConfig> {
    let mut builder = ThumbnailerConfigBuilder::new()
        .lut(lut)
        .run_log_dir(run_dir)
        .input_glob(cli.input_video_glob.clone())
        .max_concurrency(cli.jobs);

    if let Some(transcoder) = &cli.transcoder {
        builder = builder.transcoder(transcoder.clone());
    }
    if let Some(model_dir) = &cli.model_dir {
        builder = builder.model_dir(model_dir.clone());
    }
    if let Some(secs) = cli.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder.build().context("Invalid configuration")
}

fn log_summary(report: &BatchReport, total_start_time: Instant) {
    let counts = report.stage_counts();

    info!("========================================");
    info!("Jobs processed: {}", report.jobs.len());
    info!("Jobs failed:    {}", report.failed_jobs());
    info!(
        "Stages:         {} skipped, {} succeeded, {} failed",
        counts.skipped, counts.succeeded, counts.failed
    );
    for job in &report.jobs {
        let took = format_duration(job.elapsed().as_secs_f64());
        match &job.outcome {
            Ok(_) if job.has_failures() => {
                warn!("  {}: one or more stages failed ({})", job.input.display(), took)
            }
            Ok(_) => debug!("  {}: done ({})", job.input.display(), took),
            Err(e) => warn!("  {}: {}", job.input.display(), e),
        }
    }
    info!(
        "Total time:     {}",
        format_duration(total_start_time.elapsed().as_secs_f64())
    );
    info!("========================================");
}

/// Runs the whole batch described by `cli`.
pub fn run_process(cli: Cli) -> Result<BatchReport> {
    let total_start_time = Instant::now();

    let lut = resolve_lut(&cli.lut)?;
    let run_dir = create_run_dir(cli.log_dir.as_deref())?;
    let config = create_config(&cli, lut, run_dir)?;

    let run_log = RunLog::new(config.run_log_dir.clone(), config.report_level);
    init_logging(&run_log.program_log())?;

    info!("Thumbnailer run started: {}", chrono::Local::now());
    info!("LUT:         {}", config.lut.display());
    info!("Transcoder:  {}", config.transcoder.display());
    info!("Log dir:     {}", run_log.dir().display());
    info!("Input glob:  {}", config.input_glob);
    debug!("Model dir:   {}", config.model_dir.display());
    debug!("Working dir: {}", config.working_dir.display());
    if let Some(timeout) = config.timeout {
        debug!("Timeout:     {}s", timeout.as_secs());
    }

    let runner = ProcessRunner::new().with_timeout(config.timeout);
    let report = Batch::new(&runner, &config, &run_log)
        .run(&cli.files)
        .context("Batch could not be started")?;

    log_summary(&report, total_start_time);
    debug!("Finished at: {}", chrono::Local::now());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["thumbnailer"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_missing_lut_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = resolve_lut(&dir.path().join("nope.cube"));
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_config_from_args() {
        let cli = parse(&[
            "--lut",
            "g.cube",
            "--transcoder",
            "/opt/tvai/ffmpeg",
            "--model-dir",
            "/opt/tvai/models",
            "--timeout",
            "90",
            "-j",
            "3",
            "in",
        ]);
        let config =
            create_config(&cli, PathBuf::from("/luts/g.cube"), PathBuf::from("/logs/run")).unwrap();
        assert_eq!(config.lut, PathBuf::from("/luts/g.cube"));
        assert_eq!(config.transcoder, PathBuf::from("/opt/tvai/ffmpeg"));
        assert_eq!(config.working_dir, PathBuf::from("/opt/tvai"));
        assert_eq!(config.model_dir, PathBuf::from("/opt/tvai/models"));
        assert_eq!(config.max_concurrency, 3);
        assert_eq!(config.timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_empty_glob_is_a_config_error() {
        let cli = parse(&["--lut", "g.cube", "--input-video-glob", "", "in"]);
        let result = create_config(&cli, PathBuf::from("/luts/g.cube"), PathBuf::from("/logs"));
        assert!(result.is_err());
    }
}
