// src/exec/backend.rs

//! Pluggable process backend.
//!
//! The driver talks to a `ProcessBackend` instead of `tokio::process`
//! directly, so the engine can be exercised in tests with a fake backend
//! that never touches the OS.
//!
//! - `TokioProcessBackend` is the production implementation. It spawns the
//!   child with `kill_on_drop(true)` and drains stdout/stderr into shared
//!   buffers from background Tokio tasks, so polling never blocks on a full
//!   pipe. Each buffer keeps at most `capture_limit` bytes: the newest ones,
//!   which is what the stderr tail and the log normalizer care about.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::{Result, ToolrunError};
use crate::exec::spec::{ExecutionSpec, StdoutTarget};

/// Bytes captured from a process so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// A spawned process as seen by the driver.
pub trait RunningProcess: Send {
    fn pid(&self) -> Option<u32>;

    /// Non-blocking exit check. `Some(code)` once the process has exited;
    /// a process killed by a signal reports `-1`.
    fn try_wait(&mut self) -> Result<Option<i32>>;

    /// Everything captured up to now.
    fn partial_output(&self) -> CapturedOutput;

    /// Ask the process to stop. Does not wait for it.
    fn terminate(&mut self) -> Result<()>;

    /// Wait for the output readers to reach EOF after exit.
    fn drain(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Trait abstracting how processes are spawned.
pub trait ProcessBackend: Send + Sync {
    fn spawn(&self, spec: &ExecutionSpec) -> Result<Box<dyn RunningProcess>>;
}

impl<B: ProcessBackend + ?Sized> ProcessBackend for Arc<B> {
    fn spawn(&self, spec: &ExecutionSpec) -> Result<Box<dyn RunningProcess>> {
        (**self).spawn(spec)
    }
}

impl<B: ProcessBackend + ?Sized> ProcessBackend for &B {
    fn spawn(&self, spec: &ExecutionSpec) -> Result<Box<dyn RunningProcess>> {
        (**self).spawn(spec)
    }
}

/// Default per-stream capture cap.
pub const DEFAULT_CAPTURE_LIMIT: usize = 16 * 1024 * 1024;

type CaptureBuffer = Arc<Mutex<VecDeque<u8>>>;

/// Real backend built on `tokio::process`.
#[derive(Debug, Clone)]
pub struct TokioProcessBackend {
    drain_timeout: Duration,
    capture_limit: usize,
}

impl TokioProcessBackend {
    pub fn new() -> Self {
        Self {
            drain_timeout: Duration::from_secs(5),
            capture_limit: DEFAULT_CAPTURE_LIMIT,
        }
    }

    /// Keep at most `bytes` of each captured stream, dropping the oldest.
    pub fn with_capture_limit(mut self, bytes: usize) -> Self {
        self.capture_limit = bytes;
        self
    }
}

impl Default for TokioProcessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessBackend for TokioProcessBackend {
    fn spawn(&self, spec: &ExecutionSpec) -> Result<Box<dyn RunningProcess>> {
        let program = spec
            .program()
            .ok_or_else(|| ToolrunError::config("execution spec has an empty argv"))?;

        let mut cmd = Command::new(program);
        cmd.args(&spec.argv[1..])
            .current_dir(&spec.working_dir)
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match &spec.stdout {
            StdoutTarget::Capture => {
                cmd.stdout(Stdio::piped());
            }
            StdoutTarget::File(path) => {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("creating stdout file {:?}", path))?;
                cmd.stdout(Stdio::from(file));
            }
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process '{}'", program))?;

        let stdout_buf = CaptureBuffer::default();
        let stderr_buf = CaptureBuffer::default();
        let mut readers = Vec::new();

        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader("stdout", stdout, Arc::clone(&stdout_buf), self.capture_limit));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader("stderr", stderr, Arc::clone(&stderr_buf), self.capture_limit));
        }

        debug!(pid = ?child.id(), program, "process spawned");

        Ok(Box::new(TokioProcess {
            child,
            stdout: stdout_buf,
            stderr: stderr_buf,
            readers,
            drain_timeout: self.drain_timeout,
        }))
    }
}

fn spawn_reader<R>(stream: &'static str, mut reader: R, sink: CaptureBuffer, limit: usize) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut chunk = [0u8; 8192];
        let mut truncated = false;
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => match sink.lock() {
                    Ok(mut buf) => {
                        buf.extend(&chunk[..n]);
                        if buf.len() > limit {
                            let excess = buf.len() - limit;
                            buf.drain(..excess);
                            if !truncated {
                                truncated = true;
                                warn!(stream, limit, "captured output exceeds limit; keeping the newest bytes");
                            }
                        }
                    }
                    Err(_) => break,
                },
                Err(e) => {
                    debug!(error = %e, "output reader stopped");
                    break;
                }
            }
        }
    })
}

struct TokioProcess {
    child: Child,
    stdout: CaptureBuffer,
    stderr: CaptureBuffer,
    readers: Vec<JoinHandle<()>>,
    drain_timeout: Duration,
}

fn snapshot(buf: &CaptureBuffer) -> Vec<u8> {
    buf.lock()
        .map(|b| b.iter().copied().collect())
        .unwrap_or_default()
}

impl RunningProcess for TokioProcess {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn try_wait(&mut self) -> Result<Option<i32>> {
        let status = self
            .child
            .try_wait()
            .context("checking process status")?;
        Ok(status.map(|s| s.code().unwrap_or(-1)))
    }

    fn partial_output(&self) -> CapturedOutput {
        CapturedOutput {
            stdout: snapshot(&self.stdout),
            stderr: snapshot(&self.stderr),
        }
    }

    fn terminate(&mut self) -> Result<()> {
        self.child.start_kill().context("killing process")?;
        Ok(())
    }

    fn drain(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let readers = std::mem::take(&mut self.readers);
        let limit = self.drain_timeout;
        Box::pin(async move {
            for reader in readers {
                // A grandchild may keep the pipe open after the tool exits.
                if tokio::time::timeout(limit, reader).await.is_err() {
                    warn!("output reader did not finish after process exit");
                }
            }
        })
    }
}
