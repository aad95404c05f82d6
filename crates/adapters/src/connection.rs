// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The connection abstraction the engine executes through
//!
//! One implementation runs against the local machine, one over SSH. The
//! interpreter and the resource providers only ever see `dyn Connection`,
//! so everything above this line is testable without a remote host.

use crate::output::{ChunkFn, ExecOutput};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors from executing against a host. A non-zero exit code is not an
/// error; see [`ExecOutput`].
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn command: {0}")]
    SpawnFailed(String),
    #[error("command timed out after {0:?}")]
    TimedOut(Duration),
    #[error("sudo requires a password on this host")]
    SudoPasswordRequired,
    #[error("ssh channel error: {0}")]
    Channel(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("file transfer failed: {0}")]
    Transfer(String),
    #[error("execution cancelled")]
    Cancelled,
}

/// An execution target: the local machine or one authenticated SSH session.
///
/// Steps are strictly sequential per (task, host), so implementations may
/// serialize internally; callers never issue concurrent operations on one
/// connection.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Symbolic host name (`:local` or the config host name).
    fn host_name(&self) -> &str;

    /// Run a command, streaming output chunks as they arrive.
    /// Returns the exit code.
    async fn exec_streaming(
        &self,
        cmd: &str,
        env: &HashMap<String, String>,
        timeout: Duration,
        sudo: bool,
        on_chunk: ChunkFn,
    ) -> Result<i32, ExecError>;

    /// Run a command, capturing merged output. Thin wrapper over
    /// [`Connection::exec_streaming`] with a byte accumulator.
    async fn exec(
        &self,
        cmd: &str,
        env: &HashMap<String, String>,
        timeout: Duration,
        sudo: bool,
    ) -> Result<ExecOutput, ExecError> {
        let (callback, buffer) = crate::output::buffer_chunks();
        let exit_code = self
            .exec_streaming(cmd, env, timeout, sudo, callback)
            .await?;
        let output = std::mem::take(&mut *buffer.lock());
        Ok(ExecOutput { output, exit_code })
    }

    /// Copy a local file onto the target.
    async fn upload(
        &self,
        local_path: &Path,
        remote_path: &Path,
        mode: Option<u32>,
        sudo: bool,
    ) -> Result<(), ExecError>;

    /// Copy a file from the target to the control machine.
    async fn download(
        &self,
        remote_path: &Path,
        local_path: &Path,
        sudo: bool,
    ) -> Result<(), ExecError>;

    /// Write bytes to a path on the target.
    async fn write_file(
        &self,
        path: &Path,
        content: &[u8],
        mode: Option<u32>,
        sudo: bool,
    ) -> Result<(), ExecError>;

    /// Read a file from the target. `Ok(None)` when the file is absent.
    async fn read_file(&self, path: &Path, sudo: bool) -> Result<Option<Vec<u8>>, ExecError>;
}
