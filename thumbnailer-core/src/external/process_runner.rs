// ============================================================================
// thumbnailer-core/src/external/process_runner.rs
// ============================================================================
//
// PROCESS RUNNER: std::process Implementation of CommandRunner
//
// Spawns the transcoder directly (no shell), inheriting stdout/stderr so
// its console output stays visible, and blocks until it exits. An optional
// timeout kills a hung process instead of letting it hold a worker forever.

use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::{CommandRunner, Invocation, InvocationResult};
use crate::error::{CoreError, CoreResult, command_start_error, command_wait_error};

/// Interval between exit checks while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Production [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kills any command still running after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn wait_with_timeout(
        &self,
        child: &mut Child,
        program: &str,
        timeout: Duration,
        started: Instant,
    ) -> CoreResult<Option<ExitStatus>> {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(Some(status)),
                Ok(None) if started.elapsed() >= timeout => {
                    log::warn!(
                        "Command '{}' exceeded timeout of {}s, killing it",
                        program,
                        timeout.as_secs()
                    );
                    // The child may exit between try_wait and kill.
                    let _ = child.kill();
                    child.wait().map_err(|e| command_wait_error(program, e))?;
                    return Ok(None);
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(command_wait_error(program, e)),
            }
        }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> CoreResult<InvocationResult> {
        let Some((_, args)) = invocation.args.split_first() else {
            return Err(CoreError::InvalidCommand("empty argument list".to_string()));
        };
        let program = invocation.program();

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(&invocation.working_dir)
            .envs(&invocation.env)
            .stdin(Stdio::null());

        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|e| command_start_error(program, e))?;

        let status = match self.timeout {
            Some(timeout) => self.wait_with_timeout(&mut child, program, timeout, started)?,
            None => Some(child.wait().map_err(|e| command_wait_error(program, e))?),
        };

        Ok(InvocationResult {
            exit_code: status.and_then(|s| s.code()),
            elapsed: started.elapsed(),
            timed_out: status.is_none(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn sh(script: &str) -> Invocation {
        Invocation::new(
            vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            PathBuf::from("."),
        )
    }

    #[test]
    fn test_reports_exit_code() {
        let result = ProcessRunner::new().run(&sh("exit 3")).unwrap();
        assert_eq!(result.exit_code, Some(3));
        assert!(!result.success());
        assert!(!result.timed_out);
    }

    #[test]
    fn test_env_is_overlaid() {
        let env = BTreeMap::from([("THUMBNAILER_TEST_VAR".to_string(), "42".to_string())]);
        let invocation = sh(r#"[ "$THUMBNAILER_TEST_VAR" = 42 ] && [ -n "$PATH" ]"#).with_env(env);
        let result = ProcessRunner::new().run(&invocation).unwrap();
        assert!(result.success());
    }

    #[test]
    fn test_working_dir_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let mut invocation = sh("touch marker");
        invocation.working_dir = dir.path().to_path_buf();
        ProcessRunner::new().run(&invocation).unwrap();
        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn test_timeout_kills_process() {
        let runner = ProcessRunner::new().with_timeout(Some(Duration::from_millis(200)));
        let result = runner.run(&sh("sleep 5")).unwrap();
        assert!(result.timed_out);
        assert!(result.exit_code.is_none());
        assert!(result.elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_missing_program_is_start_error() {
        let invocation = Invocation::new(
            vec!["surely-not-a-real-transcoder-42".to_string()],
            PathBuf::from("."),
        );
        let err = ProcessRunner::new().run(&invocation).unwrap_err();
        assert!(
            matches!(&err, CoreError::CommandStart(program, _) if program == invocation.program())
        );
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let invocation = Invocation::new(Vec::new(), PathBuf::from("."));
        let err = ProcessRunner::new().run(&invocation).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCommand(_)));
    }
}
