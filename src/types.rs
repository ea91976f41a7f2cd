// src/types.rs

//! Data model shared by the engine and its callers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// An existing file handed to a tool. Owned by the caller; the engine only
/// reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputArtifact {
    pub id: String,
    pub display_name: String,
    pub path: PathBuf,
}

impl InputArtifact {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            path: path.into(),
        }
    }

    /// Build an input from a bare path, using the file name as display name.
    pub fn from_path(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id: id.into(),
            display_name,
            path,
        }
    }
}

/// Semantic type of a produced file.
///
/// Serializes as a bare string for the fallback tag and as an array when the
/// classifier found one or more artifact names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataType {
    Single(String),
    Tags(Vec<String>),
}

impl DataType {
    /// Build from classifier tags, falling back to `fallback` when empty.
    pub fn from_tags<I>(tags: I, fallback: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let tags: Vec<String> = tags.into_iter().collect();
        if tags.is_empty() {
            DataType::Single(fallback.into())
        } else {
            DataType::Tags(tags)
        }
    }

    pub fn tags(&self) -> Vec<&str> {
        match self {
            DataType::Single(tag) => vec![tag.as_str()],
            DataType::Tags(tags) => tags.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags().contains(&tag)
    }
}

/// One produced file, classified and registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifact {
    pub path: PathBuf,
    pub display_name: String,
    pub data_type: DataType,
    pub source_file_id: String,
}

/// Final product of one engine invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub output_files: Vec<OutputArtifact>,
    pub task_files: Vec<OutputArtifact>,
    pub workflow_id: String,
    pub command: String,
}

impl TaskResult {
    pub fn is_empty(&self) -> bool {
        self.output_files.is_empty() && self.task_files.is_empty()
    }
}

/// Progress sample emitted while a tool runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub count: u64,
    pub rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_serializes_as_string_or_array() {
        let single = DataType::from_tags(Vec::new(), "ns:file");
        assert_eq!(serde_json::to_string(&single).unwrap(), r#""ns:file""#);

        let tags = DataType::from_tags(vec!["ns:artifact:A".to_string()], "ns:file");
        assert_eq!(serde_json::to_string(&tags).unwrap(), r#"["ns:artifact:A"]"#);
    }

    #[test]
    fn input_from_path_uses_file_name() {
        let input = InputArtifact::from_path("1", "/tmp/disk/test.dd");
        assert_eq!(input.display_name, "test.dd");
    }
}
