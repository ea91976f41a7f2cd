// src/engine/context.rs

//! The caller-supplied execution context.
//!
//! The engine never reaches for a global task framework: whoever runs it
//! passes an `ExecutionContext` that receives progress and can ask the
//! current invocation to stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::types::ProgressEvent;

pub trait ExecutionContext: Send + Sync {
    fn emit_progress(&self, count: u64, rate: f64);
    fn cancel_requested(&self) -> bool;
}

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Ignores progress, never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopContext;

impl ExecutionContext for NoopContext {
    fn emit_progress(&self, _count: u64, _rate: f64) {}

    fn cancel_requested(&self) -> bool {
        false
    }
}

/// Forwards progress over a channel; cancellable through its `CancelFlag`.
#[derive(Debug, Clone)]
pub struct ChannelContext {
    progress: mpsc::UnboundedSender<ProgressEvent>,
    cancel: CancelFlag,
}

impl ChannelContext {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                progress: tx,
                cancel: CancelFlag::new(),
            },
            rx,
        )
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }
}

impl ExecutionContext for ChannelContext {
    fn emit_progress(&self, count: u64, rate: f64) {
        let _ = self.progress.send(ProgressEvent { count, rate });
    }

    fn cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Logs progress with `tracing`; used by the CLI.
#[derive(Debug, Clone)]
pub struct LoggingContext {
    label: String,
    cancel: CancelFlag,
}

impl LoggingContext {
    pub fn new(label: impl Into<String>, cancel: CancelFlag) -> Self {
        Self {
            label: label.into(),
            cancel,
        }
    }
}

impl ExecutionContext for LoggingContext {
    fn emit_progress(&self, count: u64, rate: f64) {
        info!(job = %self.label, count, rate = format_args!("{:.1}", rate), "task progress");
    }

    fn cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
