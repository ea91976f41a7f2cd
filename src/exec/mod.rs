// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`spec`] holds `ExecutionSpec`, the fully resolved invocation.
//! - [`backend`] provides the `ProcessBackend` trait and the production
//!   `TokioProcessBackend`; tests swap in a fake backend.
//! - [`driver`] spawns one process, polls it cooperatively, enforces the
//!   timeout and honours cancellation.

pub mod backend;
pub mod driver;
pub mod spec;

pub use backend::{CapturedOutput, ProcessBackend, RunningProcess, TokioProcessBackend};
pub use driver::{ExitReport, ProcessDriver, ProcessHandle, ProcessStatus};
pub use spec::{ExecutionSpec, StdoutTarget};
