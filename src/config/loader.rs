// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{JobConfig, RawJobConfig};
use crate::errors::Result;

/// Load a job file from a given path and return the raw `RawJobConfig`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for a
/// checked `JobConfig`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawJobConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_str(&contents)
}

pub fn parse_str(contents: &str) -> Result<RawJobConfig> {
    let config: RawJobConfig = toml::from_str(contents)?;
    Ok(config)
}

/// Load a job file and validate it:
///
/// - durations parse and are non-zero,
/// - encoding tokens are known,
/// - flatten/exclude globs compile,
/// - required filters are present,
/// - every invocation has a command template.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<JobConfig> {
    let raw = load_from_path(path)?;
    JobConfig::try_from(raw)
}

pub fn parse_and_validate(contents: &str) -> Result<JobConfig> {
    JobConfig::try_from(parse_str(contents)?)
}
