// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local command execution
//!
//! Spawns children through `sh -c` and streams their output. The merged
//! byte stream preserves arrival order across stdout and stderr.

use crate::cancel::{wait_cancelled, CancelToken};
use crate::connection::{Connection, ExecError};
use crate::output::{ChunkFn, ChunkSource, OutputChunk};
use crate::quote::{wrap_command, wrap_sudo};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

/// Local host name as it appears in results and telemetry.
pub const LOCAL_HOST: &str = ":local";

/// How long a cancelled child gets between SIGTERM and SIGKILL.
const TERM_GRACE: Duration = Duration::from_secs(5);

/// Executes steps on the control machine itself.
#[derive(Debug, Clone, Default)]
pub struct LocalConnection {
    name: Option<String>,
    cancel: Option<Arc<CancelToken>>,
}

impl LocalConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// A local connection reporting a specific host name, for hosts
    /// declared with `connection = "local"`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            cancel: None,
        }
    }

    /// Attach the pipeline's cancel token.
    pub fn with_cancel(mut self, token: Arc<CancelToken>) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// SIGTERM the child, wait out the grace period, then SIGKILL.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        let _ = nix::sys::signal::kill(
            nix::unistd::Pid::from_raw(pid as i32),
            nix::sys::signal::Signal::SIGTERM,
        );
        if tokio::time::timeout(TERM_GRACE, child.wait()).await.is_ok() {
            return;
        }
    }
    let _ = child.start_kill();
    let _ = child.wait().await;
}

async fn pump<R>(mut reader: R, source: ChunkSource, on_chunk: ChunkFn)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => on_chunk(OutputChunk {
                source,
                data: buf[..n].to_vec(),
            }),
        }
    }
}

/// Spawn `sh -c <cmd>` and stream output until exit, timeout, or cancel.
///
/// On timeout or cancellation the child gets SIGTERM, then SIGKILL after a
/// grace period; the caller sees no exit code in either case.
pub async fn run_streaming(
    cmd: &str,
    env: &HashMap<String, String>,
    timeout: Duration,
    on_chunk: ChunkFn,
    cancel: Option<Arc<CancelToken>>,
) -> Result<i32, ExecError> {
    if cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
        return Err(ExecError::Cancelled);
    }

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .envs(env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ExecError::SpawnFailed(e.to_string()))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let out_pump = stdout.map(|r| tokio::spawn(pump(r, ChunkSource::Stdout, on_chunk.clone())));
    let err_pump = stderr.map(|r| tokio::spawn(pump(r, ChunkSource::Stderr, on_chunk.clone())));

    let status = tokio::select! {
        waited = tokio::time::timeout(timeout, child.wait()) => match waited {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => return Err(ExecError::SpawnFailed(e.to_string())),
            Err(_elapsed) => {
                terminate(&mut child).await;
                return Err(ExecError::TimedOut(timeout));
            }
        },
        _ = wait_cancelled(&cancel) => {
            terminate(&mut child).await;
            return Err(ExecError::Cancelled);
        }
    };

    // Drain remaining buffered output before reporting the exit code.
    if let Some(handle) = out_pump {
        let _ = handle.await;
    }
    if let Some(handle) = err_pump {
        let _ = handle.await;
    }

    Ok(status.code().unwrap_or(-1))
}

#[async_trait]
impl Connection for LocalConnection {
    fn host_name(&self) -> &str {
        self.name.as_deref().unwrap_or(LOCAL_HOST)
    }

    async fn exec_streaming(
        &self,
        cmd: &str,
        env: &HashMap<String, String>,
        timeout: Duration,
        sudo: bool,
        on_chunk: ChunkFn,
    ) -> Result<i32, ExecError> {
        if sudo {
            // Env goes inside the sudo boundary so the command sees it.
            let wrapped = wrap_sudo(&wrap_command(cmd, env));
            run_streaming(&wrapped, &HashMap::new(), timeout, on_chunk, self.cancel.clone()).await
        } else {
            run_streaming(cmd, env, timeout, on_chunk, self.cancel.clone()).await
        }
    }

    async fn upload(
        &self,
        local_path: &Path,
        remote_path: &Path,
        mode: Option<u32>,
        sudo: bool,
    ) -> Result<(), ExecError> {
        let content = tokio::fs::read(local_path).await?;
        self.write_file(remote_path, &content, mode, sudo).await
    }

    async fn download(
        &self,
        remote_path: &Path,
        local_path: &Path,
        sudo: bool,
    ) -> Result<(), ExecError> {
        let content = self
            .read_file(remote_path, sudo)
            .await?
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
        mode: Option<u32>,
        sudo: bool,
    ) -> Result<(), ExecError> {
        if sudo {
            // Stage under a temp name, then move into place as root.
            let staged = std::env::temp_dir().join(format!(
                ".nexus-stage-{}",
                uuid::Uuid::new_v4().simple()
            ));
            tokio::fs::write(&staged, content).await?;
            let mut cmd = format!(
                "mv {} {}",
                crate::quote::sh_quote_path(&staged),
                crate::quote::sh_quote_path(path)
            );
            if let Some(mode) = mode {
                cmd.push_str(&format!(
                    " && chmod {:o} {}",
                    mode,
                    crate::quote::sh_quote_path(path)
                ));
            }
            let result = self
                .exec(&cmd, &HashMap::new(), Duration::from_secs(60), true)
                .await?;
            if !result.success() {
                return Err(ExecError::Transfer(result.text()));
            }
            Ok(())
        } else {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, content).await?;
            #[cfg(unix)]
            if let Some(mode) = mode {
                use std::os::unix::fs::PermissionsExt;
                tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await?;
            }
            Ok(())
        }
    }

    async fn read_file(&self, path: &Path, sudo: bool) -> Result<Option<Vec<u8>>, ExecError> {
        if sudo {
            let cmd = format!("cat {}", crate::quote::sh_quote_path(path));
            let result = self
                .exec(&cmd, &HashMap::new(), Duration::from_secs(60), true)
                .await?;
            if result.success() {
                Ok(Some(result.output))
            } else {
                Ok(None)
            }
        } else {
            match tokio::fs::read(path).await {
                Ok(content) => Ok(Some(content)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(ExecError::Io(e)),
            }
        }
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
