// src/artifacts/classify.rs

//! Maps produced files to semantic type tags.
//!
//! Some tools drop a mapping file next to their output:
//!
//! ```json
//! { "BrowserHistory": ["Users/a/History"], "WebBrowsers": ["Users/a/History"] }
//! ```
//!
//! A relative path listed under one or more artifact names gets one tag per
//! name, `<namespace>:artifact:<name>`. A missing, unreadable or malformed
//! mapping file behaves like an empty one; callers then fall back to
//! `<namespace>:file`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::DataType;

pub const DEFAULT_MAPPING_FILE: &str = "artifacts_map.json";

/// `{artifact_name -> [relative_path, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ArtifactMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl ArtifactMap {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load the mapping file, degrading to an empty map on any problem.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Self {
        if !fs.exists(path) {
            debug!(path = %path.display(), "no artifact mapping file");
            return Self::default();
        }
        let text = match fs.read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read artifact mapping file");
                return Self::default();
            }
        };
        match Self::from_json(&text) {
            Ok(map) => map,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not parse artifact mapping file");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every artifact name whose path list contains `relative_path`.
    pub fn artifact_names_for(&self, relative_path: &str) -> Vec<&str> {
        let wanted = normalize_relative(relative_path);
        self.entries
            .iter()
            .filter(|(_, paths)| paths.iter().any(|p| normalize_relative(p) == wanted))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

fn normalize_relative(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut trimmed = unified.as_str();
    loop {
        if let Some(rest) = trimmed.strip_prefix("./") {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            trimmed = rest;
        } else {
            break;
        }
    }
    trimmed.to_string()
}

#[derive(Debug, Clone)]
pub struct ArtifactClassifier {
    namespace: String,
    map: ArtifactMap,
}

impl ArtifactClassifier {
    pub fn new(namespace: impl Into<String>, map: ArtifactMap) -> Self {
        Self {
            namespace: namespace.into(),
            map,
        }
    }

    /// A classifier that only ever produces the fallback tag.
    pub fn fallback_only(namespace: impl Into<String>) -> Self {
        Self::new(namespace, ArtifactMap::default())
    }

    pub fn load(fs: &dyn FileSystem, namespace: impl Into<String>, mapping_path: &Path) -> Self {
        Self::new(namespace, ArtifactMap::load(fs, mapping_path))
    }

    pub fn fallback_tag(&self) -> String {
        format!("{}:file", self.namespace)
    }

    pub fn artifact_tag(&self, name: &str) -> String {
        format!("{}:artifact:{}", self.namespace, name)
    }

    /// Tags for `relative_path`; empty when nothing matches.
    pub fn classify(&self, relative_path: &str) -> BTreeSet<String> {
        self.map
            .artifact_names_for(relative_path)
            .into_iter()
            .map(|name| self.artifact_tag(name))
            .collect()
    }

    /// Classification with the fallback applied, never empty.
    pub fn data_type(&self, relative_path: &str) -> DataType {
        DataType::from_tags(self.classify(relative_path), self.fallback_tag())
    }
}

/// One-shot lookup: load `mapping_path` and classify `relative_path`.
pub fn classify(
    fs: &dyn FileSystem,
    mapping_path: &Path,
    namespace: &str,
    relative_path: &str,
) -> BTreeSet<String> {
    ArtifactClassifier::load(fs, namespace, mapping_path).classify(relative_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    const NS: &str = "extraction:image_export";

    fn map_path() -> &'static Path {
        Path::new("/export/artifacts_map.json")
    }

    #[test]
    fn missing_file_gives_empty_set() {
        let fs = MockFileSystem::new();
        assert!(classify(&fs, map_path(), NS, "some/file.txt").is_empty());
    }

    #[test]
    fn invalid_json_gives_empty_set() {
        let fs = MockFileSystem::new();
        fs.add_file(map_path(), "invalid json content");
        assert!(classify(&fs, map_path(), NS, "some/file.txt").is_empty());
    }

    #[test]
    fn unreadable_file_gives_empty_set() {
        let fs = MockFileSystem::new();
        fs.add_unreadable(map_path());
        assert!(classify(&fs, map_path(), NS, "some/file.txt").is_empty());
    }

    #[test]
    fn empty_object_gives_empty_set() {
        let fs = MockFileSystem::new();
        fs.add_file(map_path(), "{}");
        assert!(classify(&fs, map_path(), NS, "some/file.txt").is_empty());
    }

    #[test]
    fn path_under_several_artifacts_gets_every_tag() {
        let fs = MockFileSystem::new();
        fs.add_file(
            map_path(),
            r#"{"ArtifactA": ["path/to/file.txt"], "ArtifactB": ["other/file.txt", "path/to/file.txt"]}"#,
        );
        let tags = classify(&fs, map_path(), NS, "path/to/file.txt");
        assert_eq!(tags.len(), 2);
        assert!(tags.contains("extraction:image_export:artifact:ArtifactA"));
        assert!(tags.contains("extraction:image_export:artifact:ArtifactB"));
    }

    #[test]
    fn unknown_path_gets_fallback_data_type() {
        let map = ArtifactMap::from_json(r#"{"A": ["p/x"], "B": ["p/x", "q/y"]}"#).unwrap();
        let classifier = ArtifactClassifier::new(NS, map);
        assert!(classifier.classify("z/unknown").is_empty());
        assert_eq!(
            classifier.data_type("z/unknown"),
            DataType::Single("extraction:image_export:file".to_string())
        );
        assert_eq!(classifier.data_type("q/y").tags(), vec!["extraction:image_export:artifact:B"]);
    }

    #[test]
    fn leading_slashes_do_not_matter() {
        let map = ArtifactMap::from_json(r#"{"A": ["/p/x"]}"#).unwrap();
        assert_eq!(map.artifact_names_for("./p/x"), vec!["A"]);
    }
}
