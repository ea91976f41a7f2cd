// src/errors.rs

//! Crate-wide error type and helpers.
//!
//! Only the fatal kinds (configuration, tool execution, timeout,
//! cancellation) ever leave the engine. Parse failures in tool output and a
//! missing/corrupt artifact mapping are recovered where they happen and only
//! show up as `warn!` events.

use std::time::Duration;

use thiserror::Error;

use crate::types::OutputArtifact;

#[derive(Error, Debug)]
pub enum ToolrunError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Tool exited with code {code}: {stderr_tail}")]
    ToolExecution { code: i32, stderr_tail: String },

    #[error("Tool did not finish within {timeout:?}; process was terminated")]
    ToolTimeout { timeout: Duration },

    #[error("Execution cancelled; process was terminated")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ToolrunError {
    pub fn config(msg: impl Into<String>) -> Self {
        ToolrunError::Configuration(msg.into())
    }

    /// True for the kinds that abort a whole task.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ToolrunError::Configuration(_)
                | ToolrunError::ToolExecution { .. }
                | ToolrunError::ToolTimeout { .. }
                | ToolrunError::Cancelled
        )
    }
}

/// Error returned by [`crate::engine::Engine::execute`].
///
/// `completed` and `completed_task_files` hold what every invocation that
/// finished before the fatal error produced; all of it was already handed to
/// the output registry.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct EngineFailure {
    #[source]
    pub error: ToolrunError,
    pub completed: Vec<OutputArtifact>,
    pub completed_task_files: Vec<OutputArtifact>,
}

impl From<ToolrunError> for EngineFailure {
    fn from(error: ToolrunError) -> Self {
        Self {
            error,
            completed: Vec::new(),
            completed_task_files: Vec::new(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ToolrunError>;

/// Keep the last `max_lines` non-empty lines of captured stderr, capped at
/// `max_bytes` (cut on a char boundary).
pub fn stderr_tail(stderr: &[u8], max_lines: usize, max_bytes: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    let tail = lines[start..].join("\n");

    if tail.len() <= max_bytes {
        return tail;
    }

    let mut cut = tail.len() - max_bytes;
    while !tail.is_char_boundary(cut) {
        cut += 1;
    }
    tail[cut..].to_string()
}
