// src/exec/driver.rs

//! Spawns and supervises one external process at a time.
//!
//! Supervision is cooperative: the driver checks the process, the timeout
//! and the cancellation flag, then sleeps for `poll_interval` before the
//! next check. Nothing here blocks a Tokio worker thread.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::engine::ExecutionContext;
use crate::errors::{stderr_tail, Result, ToolrunError};
use crate::exec::backend::{CapturedOutput, ProcessBackend, RunningProcess};
use crate::exec::spec::ExecutionSpec;

const STDERR_TAIL_LINES: usize = 20;
const STDERR_TAIL_BYTES: usize = 4096;

/// How many polls to wait for a terminated process to be reaped.
const REAP_ATTEMPTS: usize = 50;
const REAP_INTERVAL: Duration = Duration::from_millis(20);

/// Status returned by [`ProcessDriver::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Running,
    Exited(i32),
}

/// A live process owned by the driver.
///
/// Consumed by [`ProcessDriver::wait`]; once the exit status is collected the
/// handle is gone.
pub struct ProcessHandle {
    pub pid: Option<u32>,
    pub started_at: DateTime<Utc>,
    pub exit_code: Option<i32>,
    command: String,
    timeout: Option<Duration>,
    started: Instant,
    process: Box<dyn RunningProcess>,
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("started_at", &self.started_at)
            .field("exit_code", &self.exit_code)
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}

impl ProcessHandle {
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Everything known about a process after it exited.
#[derive(Debug, Clone)]
pub struct ExitReport {
    pub pid: Option<u32>,
    pub started_at: DateTime<Utc>,
    pub exit_code: i32,
    pub duration: Duration,
    pub command: String,
    pub output: CapturedOutput,
}

impl ExitReport {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turn a non-zero exit into `ToolExecution`, carrying the stderr tail.
    pub fn check(self) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        Err(ToolrunError::ToolExecution {
            code: self.exit_code,
            stderr_tail: stderr_tail(&self.output.stderr, STDERR_TAIL_LINES, STDERR_TAIL_BYTES),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProcessDriver<B> {
    backend: B,
    poll_interval: Duration,
}

impl<B: ProcessBackend> ProcessDriver<B> {
    pub fn new(backend: B, poll_interval: Duration) -> Self {
        Self {
            backend,
            poll_interval,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Spawn the process described by `spec`.
    pub fn run(&self, spec: &ExecutionSpec) -> Result<ProcessHandle> {
        let command = spec.command_line();
        let process = self.backend.spawn(spec)?;
        let pid = process.pid();

        info!(pid = ?pid, cmd = %command, cwd = %spec.working_dir.display(), "tool process started");

        Ok(ProcessHandle {
            pid,
            started_at: Utc::now(),
            exit_code: None,
            command,
            timeout: spec.timeout,
            started: Instant::now(),
            process,
        })
    }

    /// Non-blocking status check.
    pub fn poll(&self, handle: &mut ProcessHandle) -> Result<ProcessStatus> {
        if let Some(code) = handle.exit_code {
            return Ok(ProcessStatus::Exited(code));
        }
        match handle.process.try_wait()? {
            Some(code) => {
                handle.exit_code = Some(code);
                Ok(ProcessStatus::Exited(code))
            }
            None => Ok(ProcessStatus::Running),
        }
    }

    pub fn read_partial_output(&self, handle: &ProcessHandle) -> CapturedOutput {
        handle.process.partial_output()
    }

    /// Kill the process and wait (bounded) until it is reaped.
    pub async fn terminate(&self, handle: &mut ProcessHandle) {
        if handle.exit_code.is_some() {
            return;
        }
        if let Err(e) = handle.process.terminate() {
            warn!(pid = ?handle.pid, error = %e, "failed to kill tool process");
        }
        for _ in 0..REAP_ATTEMPTS {
            match self.poll(handle) {
                Ok(ProcessStatus::Exited(code)) => {
                    debug!(pid = ?handle.pid, exit_code = code, "terminated process reaped");
                    return;
                }
                Ok(ProcessStatus::Running) => sleep(REAP_INTERVAL).await,
                Err(e) => {
                    warn!(pid = ?handle.pid, error = %e, "failed to reap terminated process");
                    return;
                }
            }
        }
        warn!(pid = ?handle.pid, "terminated process still running; leaving it to kill_on_drop");
    }

    /// Supervise `handle` until it exits.
    pub async fn wait(&self, handle: ProcessHandle, ctx: &dyn ExecutionContext) -> Result<ExitReport> {
        self.wait_with(handle, ctx, || {}).await
    }

    /// Like [`wait`](Self::wait), calling `on_tick` once per poll cycle.
    ///
    /// A timeout or a cancellation request kills the process and returns the
    /// matching fatal error; `on_tick` is not called again after that.
    pub async fn wait_with<F>(
        &self,
        mut handle: ProcessHandle,
        ctx: &dyn ExecutionContext,
        mut on_tick: F,
    ) -> Result<ExitReport>
    where
        F: FnMut(),
    {
        let exit_code = loop {
            if ctx.cancel_requested() {
                info!(pid = ?handle.pid, "cancellation requested; killing tool process");
                self.terminate(&mut handle).await;
                return Err(ToolrunError::Cancelled);
            }

            on_tick();

            if let ProcessStatus::Exited(code) = self.poll(&mut handle)? {
                break code;
            }

            if let Some(timeout) = handle.timeout {
                if handle.elapsed() >= timeout {
                    warn!(pid = ?handle.pid, ?timeout, "tool process timed out; killing it");
                    self.terminate(&mut handle).await;
                    return Err(ToolrunError::ToolTimeout { timeout });
                }
            }

            sleep(self.poll_interval).await;
        };

        handle.process.drain().await;
        let output = handle.process.partial_output();
        let duration = handle.elapsed();

        info!(
            pid = ?handle.pid,
            exit_code,
            success = exit_code == 0,
            elapsed_ms = duration.as_millis() as u64,
            "tool process exited"
        );

        Ok(ExitReport {
            pid: handle.pid,
            started_at: handle.started_at,
            exit_code,
            duration,
            command: handle.command,
            output,
        })
    }
}
