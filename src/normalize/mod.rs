// src/normalize/mod.rs

//! Normalization of heterogeneous tool output.
//!
//! - [`log`]: `[LEVEL] message` text into ordered `LogRecord`s.
//! - [`jsonl`]: batch JSON-lines files into one JSON array.

pub mod jsonl;
pub mod log;

pub use jsonl::{FlattenReport, RecordFlattener};
pub use log::{LogLevel, LogNormalizer, LogRecord, LogSink, TracingSink};
