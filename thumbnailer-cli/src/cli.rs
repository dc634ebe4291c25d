// thumbnailer-cli/src/cli.rs
//
// Defines the command-line argument structure using clap.

use clap::Parser;
use clap::builder::TypedValueParser;
use std::path::PathBuf;

use thumbnailer_core::config::{DEFAULT_INPUT_GLOB, DEFAULT_MAX_CONCURRENCY};

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Thumbnailer: stabilized, preview and proxy renders for video footage",
    long_about = "Runs each input video through a stabilize, preview and proxy stage using an \
                  external transcoder. Stages whose output already exists are skipped, so an \
                  interrupted run can simply be started again."
)]
pub struct Cli {
    /// Color lookup table applied by the stabilize and preview stages
    #[arg(long, value_name = "LUT_FILE")]
    pub lut: PathBuf,

    /// Pattern (matched against file names) used when walking directories
    #[arg(long, value_name = "GLOB", default_value = DEFAULT_INPUT_GLOB)]
    pub input_video_glob: String,

    /// Video files or directories to process
    #[arg(required = true, num_args = 1.., value_name = "FILES")]
    pub files: Vec<PathBuf>,

    // --- Transcoder Overrides ---
    /// Optional: Path to the transcoder executable
    #[arg(long, value_name = "PATH", env = "THUMBNAILER_TRANSCODER")]
    pub transcoder: Option<PathBuf>,

    /// Optional: Directory holding the transcoder's models
    #[arg(long, value_name = "DIR", env = "THUMBNAILER_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Optional: Base directory for run logs (defaults to ./thumbnailer-logs)
    #[arg(long, value_name = "DIR", env = "THUMBNAILER_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    // --- Scheduling ---
    /// Number of jobs processed at the same time
    #[arg(short = 'j', long, value_name = "N", default_value_t = DEFAULT_MAX_CONCURRENCY,
          value_parser = clap::value_parser!(u16).range(1..).map(usize::from))]
    pub jobs: usize,

    /// Optional: Kill a transcoder invocation after this many seconds
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}
