// src/artifacts/scan.rs

//! Post-run scan of a produce directory.
//!
//! Files are reported depth-first with directory entries in name order, so
//! the discovery order (and therefore the order of output artifacts) is
//! stable across runs.

use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::errors::{Result, ToolrunError};
use crate::fs::FileSystem;

/// A file the tool left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducedFile {
    pub path: PathBuf,
    /// Path relative to the scan root, `/`-separated.
    pub relative_path: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ArtifactScanner {
    skip_names: Vec<String>,
    exclude: Option<GlobSet>,
}

impl ArtifactScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never report files with this exact name (e.g. the mapping file).
    pub fn skip_file_name(mut self, name: impl Into<String>) -> Self {
        self.skip_names.push(name.into());
        self
    }

    /// Drop files whose relative path matches any of `patterns`.
    pub fn with_exclude_patterns(mut self, patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(self);
        }
        self.exclude = Some(build_globset(patterns)?);
        Ok(self)
    }

    pub fn scan(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<ProducedFile>> {
        let mut found = Vec::new();
        if fs.is_dir(root) {
            self.walk(fs, root, root, &mut found)?;
        }
        Ok(found)
    }

    fn walk(
        &self,
        fs: &dyn FileSystem,
        root: &Path,
        dir: &Path,
        found: &mut Vec<ProducedFile>,
    ) -> Result<()> {
        for entry in fs.read_dir(dir)? {
            // Links may loop or point outside the produce directory.
            if fs.is_symlink(&entry) {
                debug!(path = %entry.display(), "skipping symlink in produce directory");
                continue;
            }
            if fs.is_dir(&entry) {
                self.walk(fs, root, &entry, found)?;
                continue;
            }
            if !fs.is_file(&entry) {
                continue;
            }

            let display_name = entry
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if self.skip_names.iter().any(|n| *n == display_name) {
                continue;
            }

            let relative_path = relative_to(root, &entry);
            if let Some(exclude) = &self.exclude {
                if exclude.is_match(&relative_path) {
                    continue;
                }
            }

            found.push(ProducedFile {
                path: entry,
                relative_path,
                display_name,
            });
        }
        Ok(())
    }
}

fn relative_to(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Compile glob patterns, reporting a bad pattern as a configuration error.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| ToolrunError::config(format!("invalid glob pattern '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    let set = builder.build().context("building glob set")?;
    Ok(set)
}
