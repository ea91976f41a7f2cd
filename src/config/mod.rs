// src/config/mod.rs

//! Job configuration for toolrun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a job file from disk (`loader.rs`).
//! - Validate it into a `JobConfig` (`validate.rs`).
//! - Render command templates for each invocation (`template.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod template;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{load_and_validate, load_from_path, parse_and_validate, parse_str};
pub use model::{ArgTemplate, ArgvTemplate, JobConfig, LogStream, ProgressKind, RawJobConfig};
pub use template::TemplateCommand;
