// src/engine/command.rs

//! Seam between the engine and per-tool argument construction.

use std::path::Path;

use crate::dispatch::Variant;
use crate::errors::Result;
use crate::exec::ExecutionSpec;
use crate::types::InputArtifact;

/// Everything a command builder may use to produce an `ExecutionSpec`.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub input: &'a InputArtifact,
    pub variant: &'a Variant,
    /// Scoped directory the tool should write its products into.
    pub export_dir: &'a Path,
}

/// Turns one invocation into a concrete command. Which binary and which
/// flags is entirely up to the implementation.
pub trait CommandBuilder: Send + Sync {
    fn build(&self, invocation: &Invocation<'_>) -> Result<ExecutionSpec>;
}

impl<F> CommandBuilder for F
where
    F: Fn(&Invocation<'_>) -> Result<ExecutionSpec> + Send + Sync,
{
    fn build(&self, invocation: &Invocation<'_>) -> Result<ExecutionSpec> {
        self(invocation)
    }
}
