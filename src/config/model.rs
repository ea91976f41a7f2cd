// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::dispatch::{parse_filter_list, Encoding, FilterSet};

/// Job description as read from a TOML file.
///
/// ```toml
/// [job]
/// name = "image_export"
/// namespace = "extraction:image_export"
/// timeout = "2h"
/// mapping_file = "artifacts_map.json"
///
/// [tool.artifacts]
/// argv = ["image_export.py", ["--artifact_filters", "{artifacts}"], "-w", "{export_dir}", "{input}"]
///
/// [tool.files]
/// argv = ["image_export.py", ["--names", "{names}"], ["--extensions", "{extensions}"], "-w", "{export_dir}", "{input}"]
///
/// [filters]
/// required = true
/// artifacts = ["BrowserHistory"]
/// extensions = "exe,dll"
/// ```
///
/// Only `[tool]` is mandatory. Use [`JobConfig`] (via `TryFrom`) for a
/// validated configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RawJobConfig {
    #[serde(default)]
    pub job: JobSection,

    pub tool: ToolSection,

    #[serde(default)]
    pub filters: FilterSection,
}

/// `[job]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct JobSection {
    /// Tool label used in log messages and task log file names.
    #[serde(default = "default_name")]
    pub name: String,

    /// Prefix of every data type tag produced by this job.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Per-invocation timeout such as `"2h"`; unbounded if absent.
    #[serde(default)]
    pub timeout: Option<String>,

    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    #[serde(default = "default_progress_interval")]
    pub progress_interval: String,

    /// Name of the artifact mapping file the tool writes into its produce
    /// directory.
    #[serde(default)]
    pub mapping_file: Option<String>,

    /// Globs (relative to the produce directory) of JSON-lines files to
    /// flatten into one JSON array.
    #[serde(default)]
    pub flatten: Vec<String>,

    /// Globs of produced files that never become outputs.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Write the normalized tool log as a task file.
    #[serde(default)]
    pub task_log: bool,

    #[serde(default)]
    pub log_stream: LogStream,

    #[serde(default)]
    pub progress: ProgressKind,

    /// Encoding tokens, one invocation each (e.g. `["ASCII", "UTF16LE"]`).
    #[serde(default)]
    pub encodings: Vec<String>,
}

fn default_name() -> String {
    "tool".to_string()
}

fn default_namespace() -> String {
    "toolrun".to_string()
}

fn default_poll_interval() -> String {
    "500ms".to_string()
}

fn default_progress_interval() -> String {
    "2s".to_string()
}

impl Default for JobSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            namespace: default_namespace(),
            timeout: None,
            poll_interval: default_poll_interval(),
            progress_interval: default_progress_interval(),
            mapping_file: None,
            flatten: Vec::new(),
            exclude: Vec::new(),
            task_log: false,
            log_stream: LogStream::default(),
            progress: ProgressKind::default(),
            encodings: Vec::new(),
        }
    }
}

/// Which captured stream carries the tool's `[LEVEL] message` log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    #[default]
    Stderr,
    Stdout,
    None,
}

/// What the progress monitor samples in the stdout redirect file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProgressKind {
    Lines,
    Bytes,
    #[default]
    None,
}

/// One argv element: a plain argument, or an optional group that is
/// dropped entirely when any placeholder inside it resolves to empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ArgTemplate {
    Arg(String),
    Group(Vec<String>),
}

/// `[tool]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ToolSection {
    /// Command template used when no filter kind is involved, and as the
    /// fallback for kinds without their own table.
    #[serde(default)]
    pub argv: Vec<ArgTemplate>,

    /// File name (in the produce directory) receiving the tool's stdout.
    #[serde(default)]
    pub stdout: Option<String>,

    /// `[tool.artifacts]`: template for artifact-filter invocations.
    #[serde(default)]
    pub artifacts: Option<ArgvSection>,

    /// `[tool.files]`: template for name/extension/signature invocations.
    #[serde(default)]
    pub files: Option<ArgvSection>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ArgvSection {
    pub argv: Vec<ArgTemplate>,

    #[serde(default)]
    pub stdout: Option<String>,
}

/// A comma-separated string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StringList {
    One(String),
    Many(Vec<String>),
}

impl Default for StringList {
    fn default() -> Self {
        StringList::Many(Vec::new())
    }
}

impl StringList {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            StringList::One(s) => parse_filter_list(s),
            StringList::Many(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// `[filters]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FilterSection {
    /// Reject the job when no filter kind is configured.
    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub artifacts: StringList,

    #[serde(default)]
    pub names: StringList,

    #[serde(default)]
    pub extensions: StringList,

    #[serde(default)]
    pub signatures: StringList,
}

impl FilterSection {
    pub fn to_filter_set(&self) -> FilterSet {
        FilterSet {
            artifacts: self.artifacts.to_vec(),
            names: self.names.to_vec(),
            extensions: self.extensions.to_vec(),
            signatures: self.signatures.to_vec(),
        }
    }
}

/// A command template with its optional stdout redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgvTemplate {
    pub argv: Vec<ArgTemplate>,
    pub stdout: Option<String>,
}

/// Validated per-kind command templates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolTemplates {
    pub plain: Option<ArgvTemplate>,
    pub artifacts: Option<ArgvTemplate>,
    pub files: Option<ArgvTemplate>,
}

/// Validated job configuration.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub name: String,
    pub namespace: String,
    pub timeout: Option<Duration>,
    pub poll_interval: Duration,
    pub progress_interval: Duration,
    pub mapping_file: Option<String>,
    pub flatten: Vec<String>,
    pub exclude: Vec<String>,
    pub task_log: bool,
    pub log_stream: LogStream,
    pub progress: ProgressKind,
    pub encodings: Vec<Encoding>,
    pub filters: FilterSet,
    pub filters_required: bool,
    pub tool: ToolTemplates,
}
