// src/dispatch/filters.rs

//! Filter kinds and filter-string parsing.
//!
//! A job can select files from a source image in two disjoint ways: by named
//! artifact definitions, or by raw file name / extension / signature. Each
//! kind present becomes its own invocation; they are never merged into one
//! command line.

use std::fmt;

/// Split a comma-separated filter string, dropping empty items.
///
/// `"*.txt,*.log"` becomes `["*.txt", "*.log"]`.
pub fn parse_filter_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Artifacts,
    Files,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Artifacts => f.write_str("artifacts"),
            FilterKind::Files => f.write_str("files"),
        }
    }
}

/// The selection criteria of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Artifacts(Vec<String>),
    Files {
        names: Vec<String>,
        extensions: Vec<String>,
        signatures: Vec<String>,
    },
}

impl Filter {
    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::Artifacts(_) => FilterKind::Artifacts,
            Filter::Files { .. } => FilterKind::Files,
        }
    }

    /// Comma-joined value for a template placeholder; empty if this filter
    /// does not carry that criterion.
    pub fn placeholder(&self, key: &str) -> String {
        match (self, key) {
            (Filter::Artifacts(names), "artifacts") => names.join(","),
            (Filter::Files { names, .. }, "names") => names.join(","),
            (Filter::Files { extensions, .. }, "extensions") => extensions.join(","),
            (Filter::Files { signatures, .. }, "signatures") => signatures.join(","),
            _ => String::new(),
        }
    }
}

/// Every filter criterion configured for a job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    pub artifacts: Vec<String>,
    pub names: Vec<String>,
    pub extensions: Vec<String>,
    pub signatures: Vec<String>,
}

impl FilterSet {
    pub fn has_artifacts(&self) -> bool {
        !self.artifacts.is_empty()
    }

    pub fn has_files(&self) -> bool {
        !(self.names.is_empty() && self.extensions.is_empty() && self.signatures.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        !self.has_artifacts() && !self.has_files()
    }

    /// One filter per kind present, artifacts first.
    pub fn split_by_kind(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if self.has_artifacts() {
            filters.push(Filter::Artifacts(self.artifacts.clone()));
        }
        if self.has_files() {
            filters.push(Filter::Files {
                names: self.names.clone(),
                extensions: self.extensions.clone(),
                signatures: self.signatures.clone(),
            });
        }
        filters
    }
}
