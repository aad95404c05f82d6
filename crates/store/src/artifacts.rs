// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact store
//!
//! Writes stage into a temp file in the same directory and rename into
//! place, so readers never observe partial content. Name validation is a
//! hard invariant: a name that could traverse outside the pipeline
//! directory is a configuration bug and panics rather than degrading.

use nexus_core::PipelineId;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{Duration, SystemTime};
use thiserror::Error;

#[allow(clippy::expect_used)]
static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("constant regex pattern is valid"));

/// A named file produced by one task, available to dependents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub pipeline_id: PipelineId,
    pub logical_name: String,
    pub local_path: PathBuf,
    pub producer_task: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("artifact not found: {0}")]
    NotFound(String),
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Panic unless `name` is a safe artifact name.
///
/// Accepts exactly `^[A-Za-z0-9._-]+$`, length <= 255, no `..` sequence.
/// Violations are programmer/configuration errors, not runtime conditions,
/// so this raises instead of returning a recoverable error.
#[allow(clippy::panic)]
pub fn validate_name(name: &str) {
    if name.len() > 255 || name.contains("..") || !NAME_PATTERN.is_match(name) {
        panic!("invalid artifact name: {name:?}");
    }
}

/// Filesystem-backed store rooted at `<data_dir>/artifacts`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// `data_dir` is the nexus state directory (default `~/.nexus`).
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: data_dir.into().join("artifacts"),
        }
    }

    /// Directory holding one pipeline's artifacts.
    pub fn pipeline_dir(&self, pipeline_id: &PipelineId) -> PathBuf {
        self.root.join(pipeline_id.as_str())
    }

    /// Create the directory for a pipeline run.
    pub fn init(&self, pipeline_id: &PipelineId) -> Result<(), StoreError> {
        let dir = self.pipeline_dir(pipeline_id);
        std::fs::create_dir_all(&dir).map_err(io_err(&dir))?;
        Ok(())
    }

    /// Path an artifact lives at (whether or not it exists yet).
    pub fn get_path(&self, pipeline_id: &PipelineId, name: &str) -> PathBuf {
        validate_name(name);
        self.pipeline_dir(pipeline_id).join(name)
    }

    /// Store bytes under a logical name. Atomic: temp file + rename.
    pub fn store(
        &self,
        pipeline_id: &PipelineId,
        name: &str,
        content: &[u8],
    ) -> Result<(), StoreError> {
        let dest = self.get_path(pipeline_id, name);
        self.init(pipeline_id)?;
        let staged = self.pipeline_dir(pipeline_id).join(format!(
            ".{}.tmp-{}",
            name,
            uuid::Uuid::new_v4().simple()
        ));
        std::fs::write(&staged, content).map_err(io_err(&staged))?;
        std::fs::rename(&staged, &dest).map_err(io_err(&dest))?;
        tracing::debug!(pipeline_id = %pipeline_id, name, bytes = content.len(), "stored artifact");
        Ok(())
    }

    /// Store an existing file under a logical name.
    pub fn store_file(
        &self,
        pipeline_id: &PipelineId,
        name: &str,
        src: &Path,
    ) -> Result<(), StoreError> {
        let content = std::fs::read(src).map_err(io_err(src))?;
        self.store(pipeline_id, name, &content)
    }

    pub fn fetch(&self, pipeline_id: &PipelineId, name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.get_path(pipeline_id, name);
        match std::fs::read(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(io_err(&path)(e)),
        }
    }

    pub fn exists(&self, pipeline_id: &PipelineId, name: &str) -> bool {
        self.get_path(pipeline_id, name).is_file()
    }

    /// Artifact names for a pipeline, sorted for determinism.
    pub fn list(&self, pipeline_id: &PipelineId) -> Result<Vec<String>, StoreError> {
        let dir = self.pipeline_dir(pipeline_id);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&dir)(e)),
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Remove one pipeline's artifact directory.
    pub fn cleanup(&self, pipeline_id: &PipelineId) -> Result<(), StoreError> {
        let dir = self.pipeline_dir(pipeline_id);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(&dir)(e)),
        }
    }

    /// Remove pipeline directories whose mtime is older than `ttl`.
    /// Returns how many were removed.
    pub fn cleanup_expired(&self, ttl: Duration) -> Result<usize, StoreError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(io_err(&self.root)(e)),
        };
        let now = SystemTime::now();
        let mut removed = 0;
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let expired = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|mtime| now.duration_since(mtime).ok())
                .map(|age| age > ttl)
                .unwrap_or(false);
            if expired {
                if std::fs::remove_dir_all(&path).is_ok() {
                    tracing::info!(path = %path.display(), "swept expired artifact directory");
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "artifacts_tests.rs"]
mod tests;
