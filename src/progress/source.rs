// src/progress/source.rs

//! Growing resources a progress monitor can sample.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::PathBuf;

use tracing::debug;

/// A monotonically growing count, e.g. lines written by a tool.
pub trait MetricSource: Send + Sync + 'static {
    fn sample(&self) -> u64;
}

/// Number of lines in a file. A trailing line without a newline counts.
/// A file that does not exist yet counts as zero.
#[derive(Debug, Clone)]
pub struct LineCount {
    path: PathBuf,
}

impl LineCount {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MetricSource for LineCount {
    fn sample(&self) -> u64 {
        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    debug!(path = %self.path.display(), error = %e, "line count unavailable");
                }
                return 0;
            }
        };

        let mut buf = [0u8; 64 * 1024];
        let mut lines = 0u64;
        let mut last = None;
        loop {
            match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    lines += buf[..n].iter().filter(|&&b| b == b'\n').count() as u64;
                    last = Some(buf[n - 1]);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(path = %self.path.display(), error = %e, "line count read failed");
                    break;
                }
            }
        }
        match last {
            Some(b) if b != b'\n' => lines + 1,
            _ => lines,
        }
    }
}

/// Size of a file in bytes.
#[derive(Debug, Clone)]
pub struct ByteSize {
    path: PathBuf,
}

impl ByteSize {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MetricSource for ByteSize {
    fn sample(&self) -> u64 {
        std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}
