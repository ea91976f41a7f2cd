// src/artifacts/registry.rs

//! Hands produced files over to the workflow's output storage.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::{DataType, OutputArtifact};

/// Capability the engine uses to persist what a tool produced.
pub trait OutputRegistry: Send + Sync {
    /// Register a file produced by the tool. The file may live in a scoped
    /// temp directory that disappears after this call returns.
    fn register_output(
        &self,
        produced: &Path,
        display_name: &str,
        data_type: DataType,
        source_file_id: &str,
    ) -> Result<OutputArtifact>;

    /// Register a file the engine itself wrote (e.g. a normalized log).
    fn register_task_file(
        &self,
        contents: &[u8],
        display_name: &str,
        data_type: DataType,
        source_file_id: &str,
    ) -> Result<OutputArtifact>;
}

impl<R: OutputRegistry + ?Sized> OutputRegistry for Arc<R> {
    fn register_output(
        &self,
        produced: &Path,
        display_name: &str,
        data_type: DataType,
        source_file_id: &str,
    ) -> Result<OutputArtifact> {
        (**self).register_output(produced, display_name, data_type, source_file_id)
    }

    fn register_task_file(
        &self,
        contents: &[u8],
        display_name: &str,
        data_type: DataType,
        source_file_id: &str,
    ) -> Result<OutputArtifact> {
        (**self).register_task_file(contents, display_name, data_type, source_file_id)
    }
}

/// Copies outputs into a workflow output directory as `<uuid>.<ext>`.
#[derive(Debug, Clone)]
pub struct DirectoryRegistry<F = RealFileSystem> {
    output_dir: PathBuf,
    fs: F,
}

impl DirectoryRegistry<RealFileSystem> {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self::with_fs(output_dir, RealFileSystem)
    }
}

impl<F: FileSystem> DirectoryRegistry<F> {
    pub fn with_fs(output_dir: impl Into<PathBuf>, fs: F) -> Self {
        Self {
            output_dir: output_dir.into(),
            fs,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn fresh_path(&self, display_name: &str) -> PathBuf {
        let id = Uuid::new_v4().simple().to_string();
        let name = match Path::new(display_name).extension() {
            Some(ext) => format!("{}.{}", id, ext.to_string_lossy()),
            None => id,
        };
        self.output_dir.join(name)
    }
}

impl<F: FileSystem> OutputRegistry for DirectoryRegistry<F> {
    fn register_output(
        &self,
        produced: &Path,
        display_name: &str,
        data_type: DataType,
        source_file_id: &str,
    ) -> Result<OutputArtifact> {
        let path = self.fresh_path(display_name);
        self.fs.copy(produced, &path)?;
        debug!(from = %produced.display(), to = %path.display(), "registered output file");

        Ok(OutputArtifact {
            path,
            display_name: display_name.to_string(),
            data_type,
            source_file_id: source_file_id.to_string(),
        })
    }

    fn register_task_file(
        &self,
        contents: &[u8],
        display_name: &str,
        data_type: DataType,
        source_file_id: &str,
    ) -> Result<OutputArtifact> {
        let path = self.fresh_path(display_name);
        self.fs.write(&path, contents)?;

        Ok(OutputArtifact {
            path,
            display_name: display_name.to_string(),
            data_type,
            source_file_id: source_file_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn copies_under_fresh_name_keeping_extension() {
        let fs = MockFileSystem::new();
        fs.add_file("/tmp/export/History.sqlite", "db");
        let registry = DirectoryRegistry::with_fs("/out", fs.clone());

        let out = registry
            .register_output(
                Path::new("/tmp/export/History.sqlite"),
                "History.sqlite",
                DataType::Single("ns:file".into()),
                "1",
            )
            .unwrap();

        assert_eq!(out.path.parent(), Some(Path::new("/out")));
        assert_eq!(out.path.extension().unwrap(), "sqlite");
        assert_eq!(fs.contents(&out.path).unwrap(), b"db");
        assert_eq!(out.display_name, "History.sqlite");
        assert_eq!(out.source_file_id, "1");
    }

    #[test]
    fn task_file_is_written() {
        let fs = MockFileSystem::new();
        let registry = DirectoryRegistry::with_fs("/out", fs.clone());
        let out = registry
            .register_task_file(b"[INFO] ok\n", "job_disk.log", DataType::Single("ns:log".into()), "1")
            .unwrap();
        assert_eq!(fs.contents(&out.path).unwrap(), b"[INFO] ok\n");
    }
}
