// thumbnailer-core/tests/common/mod.rs
//
// Shared fixtures: a recording CommandRunner that pretends to be the
// transcoder, plus helpers for building configs over temp directories.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use thumbnailer_core::{
    CommandRunner, CoreResult, Invocation, InvocationResult, RunLog, ThumbnailerConfig,
    ThumbnailerConfigBuilder,
};

/// What the fake does when an invocation mentions a given substring.
#[derive(Clone)]
pub enum Rule {
    /// Write some bytes to the output, then exit with the code.
    FailAfterPartialWrite(i32),
    /// Exit with the code without writing anything.
    Fail(i32),
    /// Exit 0 without writing anything.
    SucceedWithoutOutput,
    Panic,
}

/// Fake transcoder: writes the last argument as the output file unless a
/// rule says otherwise, and records every call.
#[derive(Default)]
pub struct FakeRunner {
    rules: Vec<(String, Rule)>,
    delay: Duration,
    calls: Mutex<Vec<Invocation>>,
    transient_seen: Mutex<Vec<(PathBuf, bool)>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, pattern: &str, rule: Rule) -> Self {
        self.rules.push((pattern.to_string(), rule));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Transient parameter files referenced by analysis passes, and whether
    /// each existed while the pass ran.
    pub fn transient_seen(&self) -> Vec<(PathBuf, bool)> {
        self.transient_seen.lock().unwrap().clone()
    }

    fn rule_for(&self, invocation: &Invocation) -> Option<Rule> {
        self.rules
            .iter()
            .find(|(pattern, _)| invocation.args.iter().any(|a| a.contains(pattern.as_str())))
            .map(|(_, rule)| rule.clone())
    }

    fn note_transient(&self, invocation: &Invocation) {
        for arg in &invocation.args {
            if let Some(rest) = arg.strip_prefix("tvai_cpe=model=cpe-2:filename='") {
                if let Some(end) = rest.find('\'') {
                    let path = PathBuf::from(&rest[..end]);
                    let exists = path.exists();
                    self.transient_seen.lock().unwrap().push((path, exists));
                }
            }
        }
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> CoreResult<InvocationResult> {
        self.calls.lock().unwrap().push(invocation.clone());
        self.note_transient(invocation);

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let output = invocation.args.last().cloned().unwrap_or_default();
        let writes_file = output != "-";

        let exit_code = match self.rule_for(invocation) {
            Some(Rule::Panic) => panic!("fake transcoder crashed"),
            Some(Rule::Fail(code)) => code,
            Some(Rule::FailAfterPartialWrite(code)) => {
                if writes_file {
                    fs::write(&output, b"partial").unwrap();
                }
                code
            }
            Some(Rule::SucceedWithoutOutput) => 0,
            None => {
                if writes_file {
                    fs::write(&output, b"rendered video").unwrap();
                }
                0
            }
        };

        Ok(InvocationResult {
            exit_code: Some(exit_code),
            elapsed: self.delay,
            timed_out: false,
        })
    }
}

/// A temp workspace with a LUT file and a log directory.
pub struct Workspace {
    pub root: tempfile::TempDir,
    pub config: ThumbnailerConfig,
    pub run_log: RunLog,
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_concurrency(2)
    }

    pub fn with_concurrency(jobs: usize) -> Self {
        let root = tempfile::tempdir().unwrap();
        let lut = root.path().join("grade.cube");
        fs::write(&lut, b"LUT_3D_SIZE 2").unwrap();
        let log_dir = root.path().join("logs");
        fs::create_dir_all(&log_dir).unwrap();

        let config = ThumbnailerConfigBuilder::new()
            .lut(lut)
            .run_log_dir(log_dir.clone())
            .transcoder(PathBuf::from("/opt/fake/ffmpeg"))
            .model_dir(PathBuf::from("/opt/fake/models"))
            .max_concurrency(jobs)
            .build()
            .unwrap();
        let run_log = RunLog::new(log_dir, config.report_level);

        Self {
            root,
            config,
            run_log,
        }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Creates an input video (with dummy content) relative to the root.
    pub fn video(&self, relative: &str) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, b"source video").unwrap();
        path
    }
}

/// Lists the file names directly inside `dir`, sorted.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
