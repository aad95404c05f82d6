// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted fake connection for tests
//!
//! Commands are matched against registered substring rules; each rule keeps
//! a FIFO queue of responses and repeats the last one once the queue runs
//! dry, which models "state changed after apply" sequences naturally.

use crate::connection::{Connection, ExecError};
use crate::output::{ChunkFn, ChunkSource, OutputChunk};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone)]
struct Rule {
    pattern: String,
    responses: VecDeque<(String, i32)>,
}

/// In-memory [`Connection`] with scripted exec responses and a fake
/// filesystem.
#[derive(Default)]
pub struct FakeConnection {
    name: String,
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<String>>,
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl FakeConnection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Register a response for commands containing `pattern`. Multiple
    /// registrations for one pattern are served in order, the last one
    /// repeating.
    pub fn on(&self, pattern: impl Into<String>, output: impl Into<String>, exit_code: i32) {
        let pattern = pattern.into();
        let mut rules = self.rules.lock();
        if let Some(rule) = rules.iter_mut().find(|r| r.pattern == pattern) {
            rule.responses.push_back((output.into(), exit_code));
        } else {
            let mut responses = VecDeque::new();
            responses.push_back((output.into(), exit_code));
            rules.push(Rule { pattern, responses });
        }
    }

    /// Every command executed so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn seed_file(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        self.files.lock().insert(path.into(), content.into());
    }

    pub fn file(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().get(path).cloned()
    }

    fn respond(&self, cmd: &str) -> (String, i32) {
        let mut rules = self.rules.lock();
        for rule in rules.iter_mut() {
            if cmd.contains(&rule.pattern) {
                return if rule.responses.len() > 1 {
                    rule.responses.pop_front().unwrap_or_default()
                } else {
                    rule.responses.front().cloned().unwrap_or_default()
                };
            }
        }
        (String::new(), 0)
    }
}

#[async_trait]
impl Connection for FakeConnection {
    fn host_name(&self) -> &str {
        &self.name
    }

    async fn exec_streaming(
        &self,
        cmd: &str,
        _env: &HashMap<String, String>,
        _timeout: Duration,
        sudo: bool,
        on_chunk: ChunkFn,
    ) -> Result<i32, ExecError> {
        let recorded = if sudo {
            format!("sudo: {cmd}")
        } else {
            cmd.to_string()
        };
        self.calls.lock().push(recorded);
        let (output, exit_code) = self.respond(cmd);
        if !output.is_empty() {
            on_chunk(OutputChunk {
                source: ChunkSource::Stdout,
                data: output.into_bytes(),
            });
        }
        Ok(exit_code)
    }

    async fn upload(
        &self,
        local_path: &Path,
        remote_path: &Path,
        _mode: Option<u32>,
        _sudo: bool,
    ) -> Result<(), ExecError> {
        let content = tokio::fs::read(local_path).await?;
        self.files.lock().insert(remote_path.to_path_buf(), content);
        Ok(())
    }

    async fn download(
        &self,
        remote_path: &Path,
        local_path: &Path,
        _sudo: bool,
    ) -> Result<(), ExecError> {
        let content = self
            .files
            .lock()
            .get(remote_path)
            .cloned()
            .ok_or_else(|| ExecError::Transfer(format!("{} not found", remote_path.display())))?;
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local_path, content).await?;
        Ok(())
    }

    async fn write_file(
        &self,
        path: &Path,
        content: &[u8],
        _mode: Option<u32>,
        _sudo: bool,
    ) -> Result<(), ExecError> {
        self.files.lock().insert(path.to_path_buf(), content.to_vec());
        Ok(())
    }

    async fn read_file(&self, path: &Path, _sudo: bool) -> Result<Option<Vec<u8>>, ExecError> {
        Ok(self.files.lock().get(path).cloned())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
