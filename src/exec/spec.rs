// src/exec/spec.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the tool's stdout goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StdoutTarget {
    /// Piped and kept in memory (readable via `read_partial_output`).
    #[default]
    Capture,
    /// Written straight into a file, e.g. a produced artifact that the
    /// progress monitor samples while the tool runs.
    File(PathBuf),
}

/// A fully resolved invocation: one spec, one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSpec {
    pub argv: Vec<String>,
    pub working_dir: PathBuf,
    /// `None` means the process may run for as long as it needs.
    pub timeout: Option<Duration>,
    pub stdout: StdoutTarget,
}

impl ExecutionSpec {
    pub fn new<I, S>(argv: I, working_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            working_dir: working_dir.into(),
            timeout: None,
            stdout: StdoutTarget::Capture,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_stdout_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout = StdoutTarget::File(path.into());
        self
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn stdout_file(&self) -> Option<&Path> {
        match &self.stdout {
            StdoutTarget::File(path) => Some(path),
            StdoutTarget::Capture => None,
        }
    }

    /// The command as it is reported in a `TaskResult`.
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }
}
