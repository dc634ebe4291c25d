//! Input discovery.
//!
//! A top-level argument that is a directory is walked recursively and every
//! entry whose file name matches the input glob is collected, sorted so runs
//! are reproducible. Any other argument is taken as a single input. The
//! candidate filter then drops directories and files this tool produced.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use regex::Regex;
use walkdir::WalkDir;

use crate::error::{CoreError, CoreResult};
use crate::stage::is_derived_output;

/// Case-sensitive shell-style pattern matched against file names.
///
/// Supports `*`, `?`, `[abc]`, `[a-z]` and `[!abc]`. An unterminated `[` is
/// taken literally.
#[derive(Debug, Clone)]
pub struct GlobMatcher {
    pattern: String,
    regex: Regex,
}

impl GlobMatcher {
    pub fn new(pattern: &str) -> CoreResult<Self> {
        let regex = Regex::new(&glob_to_regex(pattern))
            .map_err(|e| CoreError::InvalidGlob(pattern.to_string(), e.to_string()))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^");
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.push_str(&translate_class(&chars[i + 1..end]));
                    i = end;
                }
                None => out.push_str(r"\["),
            },
            c => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }

    out.push('$');
    out
}

/// Index of the `]` closing the class opened at `start`, if any.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    // A `]` right after the opening is a literal member.
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    (j..chars.len()).find(|&k| chars[k] == ']')
}

fn translate_class(body: &[char]) -> String {
    let mut out = String::from("[");
    let mut rest = body;
    if let Some(('!', tail)) = rest.split_first() {
        out.push('^');
        rest = tail;
    }
    for &c in rest {
        match c {
            '\\' | '[' | ']' | '^' | '&' | '~' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(']');
    out
}

/// Expands one top-level argument into candidate paths.
///
/// Directories are walked recursively; unreadable entries below the root are
/// logged and skipped. Anything else is returned unchanged, even if it does
/// not exist, so the job reports it.
pub fn expand_input(path: &Path, matcher: &GlobMatcher) -> CoreResult<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).min_depth(1) {
        match entry {
            Ok(entry) => {
                if matcher.is_match(&entry.file_name().to_string_lossy()) {
                    files.push(entry.into_path());
                }
            }
            Err(e) if e.depth() == 0 => return Err(CoreError::Walkdir(e)),
            Err(e) => warn!("Skipping unreadable entry under {}: {}", path.display(), e),
        }
    }

    files.sort();
    Ok(files)
}

/// Whether a discovered path should become a job.
pub fn is_job_candidate(path: &Path) -> bool {
    if path.is_dir() {
        debug!("Ignoring directory {}", path.display());
        return false;
    }
    if is_derived_output(path) {
        debug!("Ignoring derived output {}", path.display());
        return false;
    }
    true
}
