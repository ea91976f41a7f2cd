// src/engine/mod.rs

//! Orchestration engine for toolrun.
//!
//! This module ties together:
//! - the caller-supplied [`ExecutionContext`] (progress sink, cancellation)
//! - the [`CommandBuilder`] seam that turns one invocation into a command
//! - the [`Engine`] itself, which runs every planned invocation serially and
//!   collates what the tool produced

pub mod command;
pub mod context;
pub mod runner;

pub use command::{CommandBuilder, Invocation};
pub use context::{CancelFlag, ChannelContext, ExecutionContext, LoggingContext, NoopContext};
pub use runner::{Engine, InvocationOutput};
