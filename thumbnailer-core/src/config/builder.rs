// ============================================================================
// thumbnailer-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for ThumbnailerConfig
//
// Fluent construction of ThumbnailerConfig. Only the LUT and the run log
// directory are required; everything else falls back to the constants in
// the parent module. `build` validates the result.
//
// Commands run from the transcoder's directory, so every relative path is
// anchored to the caller's current directory before it is stored.

use std::path::{self, PathBuf};
use std::time::Duration;

use super::{ThumbnailerConfig, default_working_dir};
use crate::error::{CoreError, CoreResult};

/// Builder for creating ThumbnailerConfig instances.
///
/// # Examples
///
/// ```rust
/// use thumbnailer_core::config::ThumbnailerConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ThumbnailerConfigBuilder::new()
///     .lut(PathBuf::from("/luts/grade.cube"))
///     .run_log_dir(PathBuf::from("/tmp/thumbnailer-logs/20240601_120000"))
///     .transcoder(PathBuf::from("/usr/local/bin/ffmpeg"))
///     .max_concurrency(3)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.working_dir, PathBuf::from("/usr/local/bin"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ThumbnailerConfigBuilder {
    // Required fields
    lut: Option<PathBuf>,
    run_log_dir: Option<PathBuf>,

    // Optional overrides
    transcoder: Option<PathBuf>,
    model_dir: Option<PathBuf>,
    working_dir: Option<PathBuf>,
    input_glob: Option<String>,
    max_concurrency: Option<usize>,
    report_level: Option<u8>,
    timeout: Option<Duration>,
}

impl ThumbnailerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lut(mut self, lut: PathBuf) -> Self {
        self.lut = Some(lut);
        self
    }

    pub fn run_log_dir(mut self, dir: PathBuf) -> Self {
        self.run_log_dir = Some(dir);
        self
    }

    /// Sets the transcoder executable. Unless `working_dir` is also set, the
    /// working directory follows the executable's parent.
    pub fn transcoder(mut self, transcoder: PathBuf) -> Self {
        self.transcoder = Some(transcoder);
        self
    }

    pub fn model_dir(mut self, dir: PathBuf) -> Self {
        self.model_dir = Some(dir);
        self
    }

    pub fn working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    pub fn input_glob(mut self, glob: impl Into<String>) -> Self {
        self.input_glob = Some(glob.into());
        self
    }

    pub fn max_concurrency(mut self, jobs: usize) -> Self {
        self.max_concurrency = Some(jobs);
        self
    }

    pub fn report_level(mut self, level: u8) -> Self {
        self.report_level = Some(level);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> CoreResult<ThumbnailerConfig> {
        let lut = self
            .lut
            .ok_or_else(|| CoreError::Config("a LUT path is required".to_string()))?;
        let run_log_dir = self
            .run_log_dir
            .ok_or_else(|| CoreError::Config("a run log directory is required".to_string()))?;

        let mut config = ThumbnailerConfig::new(anchor(lut)?, anchor(run_log_dir)?);

        if let Some(transcoder) = self.transcoder {
            // A bare program name is left for PATH lookup.
            let transcoder = if transcoder.components().count() > 1 {
                anchor(transcoder)?
            } else {
                transcoder
            };
            config.working_dir = default_working_dir(&transcoder);
            config.transcoder = transcoder;
        }
        if let Some(dir) = self.model_dir {
            config.model_dir = anchor(dir)?;
        }
        if let Some(dir) = self.working_dir {
            config.working_dir = anchor(dir)?;
        }
        if let Some(glob) = self.input_glob {
            config.input_glob = glob;
        }
        if let Some(jobs) = self.max_concurrency {
            config.max_concurrency = jobs;
        }
        if let Some(level) = self.report_level {
            config.report_level = level;
        }
        config.timeout = self.timeout;

        config.validate()?;
        Ok(config)
    }
}

/// Resolves a relative path against the current directory. Empty paths are
/// kept so `validate` can report them.
fn anchor(path: PathBuf) -> CoreResult<PathBuf> {
    if path.as_os_str().is_empty() || path.is_absolute() {
        return Ok(path);
    }
    path::absolute(&path)
        .map_err(|e| CoreError::Config(format!("cannot resolve '{}': {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_lut() {
        let result = ThumbnailerConfigBuilder::new()
            .run_log_dir(PathBuf::from("logs"))
            .build();
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_explicit_working_dir_wins() {
        let config = ThumbnailerConfigBuilder::new()
            .lut(PathBuf::from("grade.cube"))
            .run_log_dir(PathBuf::from("logs"))
            .working_dir(PathBuf::from("/work"))
            .transcoder(PathBuf::from("/opt/bin/ffmpeg"))
            .input_glob("*.mov")
            .build()
            .unwrap();
        assert_eq!(config.working_dir, PathBuf::from("/work"));
        assert_eq!(config.transcoder, PathBuf::from("/opt/bin/ffmpeg"));
        assert_eq!(config.input_glob, "*.mov");
    }

    #[test]
    fn test_build_rejects_empty_glob() {
        let result = ThumbnailerConfigBuilder::new()
            .lut(PathBuf::from("grade.cube"))
            .run_log_dir(PathBuf::from("logs"))
            .input_glob("")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_relative_paths_are_anchored() {
        let cwd = std::env::current_dir().unwrap();
        let config = ThumbnailerConfigBuilder::new()
            .lut(PathBuf::from("grade.cube"))
            .run_log_dir(PathBuf::from("logs/run"))
            .transcoder(PathBuf::from("tools/ffmpeg"))
            .model_dir(PathBuf::from("tools/models"))
            .build()
            .unwrap();
        assert_eq!(config.lut, cwd.join("grade.cube"));
        assert_eq!(config.run_log_dir, cwd.join("logs/run"));
        assert_eq!(config.transcoder, cwd.join("tools/ffmpeg"));
        assert_eq!(config.working_dir, cwd.join("tools"));
        assert_eq!(config.model_dir, cwd.join("tools/models"));
    }

    #[test]
    fn test_bare_transcoder_name_is_kept() {
        let config = ThumbnailerConfigBuilder::new()
            .lut(PathBuf::from("/luts/grade.cube"))
            .run_log_dir(PathBuf::from("/logs"))
            .transcoder(PathBuf::from("ffmpeg"))
            .build()
            .unwrap();
        assert_eq!(config.transcoder, PathBuf::from("ffmpeg"));
        assert_eq!(config.working_dir, PathBuf::from("."));
    }
}
