// src/normalize/jsonl.rs

//! Repairs batch-oriented JSON-lines output.
//!
//! Some tools write one JSON array per line, each wrapping zero or more
//! records. Downstream consumers want a single JSON array, so the flattener
//! rewrites the file as exactly that. An output with no records becomes the
//! literal `[]`, never a zero-byte file.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;

/// Outcome of flattening one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenReport {
    pub path: PathBuf,
    pub records: usize,
    pub skipped_lines: usize,
}

/// Records parsed from JSON-lines text, plus how many lines were skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flattened {
    pub records: Vec<Value>,
    pub skipped_lines: usize,
}

#[derive(Debug, Clone)]
pub struct RecordFlattener {
    label: String,
}

impl RecordFlattener {
    /// `label` names the producing tool in warnings.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Parse every line on its own. Arrays contribute their elements, any
    /// other JSON value counts as a single record, unparsable lines are
    /// skipped with a warning.
    pub fn flatten_str(&self, source: &Path, text: &str) -> Flattened {
        let mut out = Flattened::default();

        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(line) {
                Ok(Value::Array(items)) => out.records.extend(items),
                Ok(other) => out.records.push(other),
                Err(e) => {
                    warn!(
                        path = %source.display(),
                        line = idx + 1,
                        error = %e,
                        "could not parse {} output line",
                        self.label
                    );
                    out.skipped_lines += 1;
                }
            }
        }

        out
    }

    /// Flatten `path` in place.
    pub fn flatten(&self, path: &Path) -> Result<Option<FlattenReport>> {
        self.flatten_to(path, path)
    }

    /// Flatten `source` into `target`. A missing source is logged and
    /// reported as `Ok(None)`; nothing is written.
    pub fn flatten_to(&self, source: &Path, target: &Path) -> Result<Option<FlattenReport>> {
        let bytes = match std::fs::read(source) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %source.display(), "Could not find {} outputfile.", self.label);
                return Ok(None);
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("reading {:?}", source))
                    .into());
            }
        };

        let text = String::from_utf8_lossy(&bytes);
        let flattened = self.flatten_str(source, &text);
        write_atomically(target, render_array(&flattened.records)?.as_bytes())?;

        debug!(
            path = %target.display(),
            records = flattened.records.len(),
            skipped = flattened.skipped_lines,
            "flattened JSON-lines output"
        );

        Ok(Some(FlattenReport {
            path: target.to_path_buf(),
            records: flattened.records.len(),
            skipped_lines: flattened.skipped_lines,
        }))
    }
}

/// One JSON array, one record per line after the opening bracket.
pub fn render_array(records: &[Value]) -> Result<String> {
    if records.is_empty() {
        return Ok("[]".to_string());
    }
    let mut out = String::from("[");
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            out.push_str(",\n");
        }
        out.push_str(&serde_json::to_string(record)?);
    }
    out.push(']');
    Ok(out)
}

fn write_atomically(target: &Path, contents: &[u8]) -> Result<()> {
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {:?}", dir))?;
    tmp.write_all(contents)
        .with_context(|| format!("writing flattened output for {:?}", target))?;
    tmp.persist(target)
        .map_err(|e| anyhow::Error::new(e.error).context(format!("replacing {:?}", target)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flattener() -> RecordFlattener {
        RecordFlattener::new("fraken-x")
    }

    #[test]
    fn concatenates_wrapped_records_in_order() {
        let text = "[{\"a\":1}]\n[{\"b\":2}]\n";
        let out = flattener().flatten_str(Path::new("x"), text);
        assert_eq!(out.records, vec![json!({"a": 1}), json!({"b": 2})]);
        assert_eq!(out.skipped_lines, 0);
    }

    #[test]
    fn bad_line_is_skipped_and_later_lines_survive() {
        let text = "[{\"a\":1}]\ninvalid json\n[{\"b\":2},{\"c\":3}]\n";
        let out = flattener().flatten_str(Path::new("x"), text);
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.skipped_lines, 1);
    }

    #[test]
    fn empty_lists_contribute_nothing() {
        let out = flattener().flatten_str(Path::new("x"), "[]\n[]\n");
        assert!(out.records.is_empty());
        assert_eq!(render_array(&out.records).unwrap(), "[]");
    }

    #[test]
    fn bare_object_counts_as_one_record() {
        let out = flattener().flatten_str(Path::new("x"), "{\"a\":1}\n");
        assert_eq!(out.records, vec![json!({"a": 1})]);
    }

    #[test]
    fn rendered_array_parses_as_a_whole() {
        let records = vec![json!({"a": 1}), json!({"b": [1, 2]})];
        let rendered = render_array(&records).unwrap();
        assert!(rendered.starts_with("[{"));
        let parsed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, Value::Array(records));
    }

    #[test]
    fn missing_source_is_none_and_writes_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("results.jsonl");
        let target = dir.path().join("results.json");

        let report = flattener().flatten_to(&source, &target).unwrap();

        assert_eq!(report, None);
        assert!(!source.exists());
        assert!(!target.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn all_empty_lists_rewrite_the_file_as_an_empty_array() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("results.jsonl");
        std::fs::write(&path, "[]\n[]\n").unwrap();

        let report = flattener().flatten(&path).unwrap().unwrap();

        assert_eq!(report.records, 0);
        assert_eq!(report.skipped_lines, 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn flatten_in_place_replaces_lines_with_one_array() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("results.jsonl");
        std::fs::write(&path, "[{\"a\":1}]\nnot json\n[{\"b\":2}]\n").unwrap();

        let report = flattener().flatten(&path).unwrap().unwrap();

        assert_eq!(report.records, 2);
        assert_eq!(report.skipped_lines, 1);
        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, json!([{"a": 1}, {"b": 2}]));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
