//! Job execution engine for batch video stabilization, preview and proxy
//! generation through an external transcoder.
//!
//! Every input file becomes one job of three fixed stages. A stage whose
//! output already exists is skipped, outputs are written to a temporary
//! sibling and renamed into place, and jobs run on a bounded worker pool
//! where one failure never cancels the rest.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use thumbnailer_core::{Batch, ProcessRunner, RunLog, ThumbnailerConfigBuilder};
//! use std::path::PathBuf;
//!
//! let config = ThumbnailerConfigBuilder::new()
//!     .lut(PathBuf::from("/luts/grade.cube"))
//!     .run_log_dir(PathBuf::from("/tmp/thumbnailer-logs/20240601_120000"))
//!     .build()
//!     .unwrap();
//! let run_log = RunLog::new(config.run_log_dir.clone(), config.report_level);
//! let runner = ProcessRunner::new().with_timeout(config.timeout);
//!
//! let report = Batch::new(&runner, &config, &run_log)
//!     .run(&[PathBuf::from("/footage")])
//!     .unwrap();
//! println!("{} job(s), {} with failures", report.jobs.len(), report.failed_jobs());
//! ```

pub mod batch;
pub mod config;
pub mod discovery;
pub mod error;
pub mod external;
pub mod logging;
pub mod pipeline;
pub mod stage;
pub mod utils;

// Re-exports for public API
pub use batch::{Batch, BatchReport, JobReport, StageCounts};
pub use config::{ThumbnailerConfig, ThumbnailerConfigBuilder};
pub use discovery::{GlobMatcher, expand_input, is_job_candidate};
pub use error::{CoreError, CoreResult};
pub use external::{CommandRunner, Invocation, InvocationResult, ProcessRunner};
pub use logging::RunLog;
pub use pipeline::{JobPipeline, StageExecutor};
pub use stage::{Stage, StageName, StageOutcome, StageStatus};
pub use utils::format_duration;
