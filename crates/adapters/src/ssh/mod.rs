// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSH connections
//!
//! One [`SshConnection`] is a single authenticated session to one host.
//! ssh2 is a blocking API, so every operation runs inside
//! `tokio::task::spawn_blocking` with the session behind a mutex; steps on
//! one (task, host) are sequential, so the lock is uncontended in practice.

pub mod pool;

use crate::connection::{Connection, ExecError};
use crate::output::{ChunkFn, ChunkSource, ExecOutput, OutputChunk};
use crate::quote::{sh_quote_path, wrap_command, wrap_sudo};
use async_trait::async_trait;
use nexus_core::Host;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default connect timeout (spec: 10 s).
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for the cheap liveness probe.
const ALIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Backoff schedule for transient network failures.
const CONNECT_BACKOFF: &[Duration] = &[
    Duration::from_millis(250),
    Duration::from_millis(500),
    Duration::from_millis(1000),
];

#[derive(Debug, Error, Clone)]
pub enum ConnectError {
    #[error("authentication failed for {user}@{host}: {reason}")]
    AuthFailed {
        user: String,
        host: String,
        reason: String,
    },
    #[error("connection to {0} timed out")]
    Timeout(String),
    #[error("connection to {0} refused")]
    ConnectionRefused(String),
    #[error("host key verification failed for {0}")]
    HostKeyMismatch(String),
    #[error("cannot resolve {0}")]
    Resolve(String),
    #[error("network error connecting to {host}: {reason}")]
    Network { host: String, reason: String },
}

impl ConnectError {
    /// Transient failures worth a retry with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ConnectError::ConnectionRefused(_) | ConnectError::Network { .. }
        )
    }
}

/// Session-wide options, typically from CLI flags; host fields win unless a
/// CLI override is present.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Override user for every host (CLI `-u`)
    pub user: Option<String>,
    /// Override identity file for every host (CLI `-i`)
    pub identity: Option<PathBuf>,
    /// Connect timeout; defaults to [`CONNECT_TIMEOUT`]
    pub timeout: Option<Duration>,
    /// Pipeline cancel token; in-flight execs return early when fired
    pub cancel: Option<Arc<crate::cancel::CancelToken>>,
}

impl ConnectOptions {
    fn effective_user(&self, host: &Host) -> String {
        self.user
            .clone()
            .or_else(|| host.user.clone())
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "root".to_string())
    }

    fn effective_identity(&self, host: &Host) -> Option<PathBuf> {
        self.identity.clone().or_else(|| host.identity.clone())
    }
}

/// A single authenticated channel to one remote host.
pub struct SshConnection {
    host_name: String,
    addr: String,
    session: Arc<Mutex<ssh2::Session>>,
    cancel: Option<Arc<crate::cancel::CancelToken>>,
}

impl std::fmt::Debug for SshConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshConnection")
            .field("host_name", &self.host_name)
            .field("addr", &self.addr)
            .finish()
    }
}

fn classify_io(addr: &str, e: &std::io::Error) -> ConnectError {
    match e.kind() {
        std::io::ErrorKind::ConnectionRefused => ConnectError::ConnectionRefused(addr.to_string()),
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
            ConnectError::Timeout(addr.to_string())
        }
        _ => ConnectError::Network {
            host: addr.to_string(),
            reason: e.to_string(),
        },
    }
}

fn handshake_error(addr: &str, e: &ssh2::Error) -> ConnectError {
    let reason = e.to_string();
    if reason.to_ascii_lowercase().contains("host key") {
        ConnectError::HostKeyMismatch(addr.to_string())
    } else {
        ConnectError::Network {
            host: addr.to_string(),
            reason,
        }
    }
}

impl SshConnection {
    /// Connect and authenticate. Identity-file auth takes precedence over
    /// password when both are configured.
    pub async fn connect(host: &Host, opts: &ConnectOptions) -> Result<Self, ConnectError> {
        let host = host.clone();
        let opts = opts.clone();
        tokio::task::spawn_blocking(move || Self::connect_blocking(&host, &opts))
            .await
            .map_err(|e| ConnectError::Network {
                host: "?".to_string(),
                reason: format!("connect task failed: {e}"),
            })?
    }

    /// Connect with retry on transient network failures (250/500/1000 ms).
    pub async fn connect_with_retry(
        host: &Host,
        opts: &ConnectOptions,
    ) -> Result<Self, ConnectError> {
        let mut last = None;
        for (attempt, delay) in std::iter::once(None)
            .chain(CONNECT_BACKOFF.iter().map(Some))
            .enumerate()
        {
            if let Some(delay) = delay {
                tokio::time::sleep(*delay).await;
            }
            match Self::connect(host, opts).await {
                Ok(conn) => return Ok(conn),
                Err(e) if e.is_transient() => {
                    tracing::warn!(
                        host = %host.name,
                        attempt,
                        error = %e,
                        "transient connect failure, will retry"
                    );
                    last = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        // CONNECT_BACKOFF is non-empty, so last is always set here.
        Err(last.unwrap_or(ConnectError::Timeout("exhausted retries".to_string())))
    }

    fn connect_blocking(host: &Host, opts: &ConnectOptions) -> Result<Self, ConnectError> {
        let addr = format!("{}:{}", host.hostname, host.port);
        let timeout = opts.timeout.unwrap_or(CONNECT_TIMEOUT);
        let user = opts.effective_user(host);

        let sockaddr = addr
            .to_socket_addrs()
            .map_err(|_| ConnectError::Resolve(addr.clone()))?
            .next()
            .ok_or_else(|| ConnectError::Resolve(addr.clone()))?;

        let tcp = TcpStream::connect_timeout(&sockaddr, timeout)
            .map_err(|e| classify_io(&addr, &e))?;

        let mut session = ssh2::Session::new().map_err(|e| ConnectError::Network {
            host: addr.clone(),
            reason: e.to_string(),
        })?;
        session.set_tcp_stream(tcp);
        session.set_timeout(timeout.as_millis() as u32);
        session
            .handshake()
            .map_err(|e| handshake_error(&addr, &e))?;

        let auth_result = if let Some(identity) = opts.effective_identity(host) {
            session.userauth_pubkey_file(&user, None, &identity, None)
        } else if let Some(password) = &host.password {
            session.userauth_password(&user, password)
        } else {
            session.userauth_agent(&user)
        };
        auth_result.map_err(|e| ConnectError::AuthFailed {
            user: user.clone(),
            host: addr.clone(),
            reason: e.to_string(),
        })?;

        if !session.authenticated() {
            return Err(ConnectError::AuthFailed {
                user,
                host: addr,
                reason: "server rejected all methods".to_string(),
            });
        }

        tracing::debug!(host = %host.name, %addr, %user, "ssh session established");
        Ok(Self {
            host_name: host.name.clone(),
            addr,
            session: Arc::new(Mutex::new(session)),
            cancel: opts.cancel.clone(),
        })
    }

    /// Cheap liveness probe: `true` with a short timeout.
    pub async fn is_alive(&self) -> bool {
        self.exec_raw("true", ALIVE_TIMEOUT, None)
            .await
            .map(|out| out.exit_code == 0)
            .unwrap_or(false)
    }

    /// Close the session. Errors are ignored; the peer may already be gone.
    pub async fn close(&self) {
        let session = Arc::clone(&self.session);
        let _ = tokio::task::spawn_blocking(move || {
            let session = session.lock();
            let _ = session.disconnect(None, "closing", None);
        })
        .await;
    }

    /// Run a raw command line (already quoted/wrapped by the caller).
    ///
    /// On cancellation the await returns early with `Cancelled`; the
    /// blocking worker finishes in the background, bounded by the session
    /// timeout.
    async fn exec_raw(
        &self,
        command: &str,
        timeout: Duration,
        on_chunk: Option<ChunkFn>,
    ) -> Result<ExecOutput, ExecError> {
        if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Err(ExecError::Cancelled);
        }
        let cancel = self.cancel.clone();
        let session = Arc::clone(&self.session);
        let command = command.to_string();
        let work = tokio::task::spawn_blocking(move || {
            let session = session.lock();
            session.set_timeout(timeout.as_millis() as u32);

            let mut channel = session
                .channel_session()
                .map_err(|e| ExecError::Channel(e.to_string()))?;
            channel
                .exec(&command)
                .map_err(|e| ExecError::Channel(e.to_string()))?;

            let mut merged = Vec::new();
            let mut buf = [0u8; 8192];

            // stdout to EOF, then stderr; libssh2 buffers the other stream.
            loop {
                match channel.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        merged.extend_from_slice(&buf[..n]);
                        if let Some(cb) = &on_chunk {
                            cb(OutputChunk {
                                source: ChunkSource::Stdout,
                                data: buf[..n].to_vec(),
                            });
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                        return Err(ExecError::TimedOut(timeout));
                    }
                    Err(e) => return Err(ExecError::Channel(e.to_string())),
                }
            }
            loop {
                match channel.stderr().read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        merged.extend_from_slice(&buf[..n]);
                        if let Some(cb) = &on_chunk {
                            cb(OutputChunk {
                                source: ChunkSource::Stderr,
                                data: buf[..n].to_vec(),
                            });
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                        return Err(ExecError::TimedOut(timeout));
                    }
                    Err(e) => return Err(ExecError::Channel(e.to_string())),
                }
            }

            channel
                .wait_close()
                .map_err(|e| ExecError::Channel(e.to_string()))?;
            let exit_code = channel
                .exit_status()
                .map_err(|e| ExecError::Channel(e.to_string()))?;

            Ok(ExecOutput {
                output: merged,
                exit_code,
            })
        });

        tokio::select! {
            joined = work => {
                joined.map_err(|e| ExecError::Channel(format!("exec task failed: {e}")))?
            }
            _ = crate::cancel::wait_cancelled(&cancel) => Err(ExecError::Cancelled),
        }
    }

    fn detect_sudo_password(output: &ExecOutput) -> bool {
        if output.exit_code == 0 {
            return false;
        }
        let text = output.text().to_ascii_lowercase();
        text.contains("a password is required") || text.contains("a terminal is required")
    }

    async fn scp_send(
        &self,
        remote_path: &Path,
        content: Vec<u8>,
        mode: i32,
    ) -> Result<(), ExecError> {
        use std::io::Write;
        let session = Arc::clone(&self.session);
        let remote_path = remote_path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let session = session.lock();
            let mut channel = session
                .scp_send(&remote_path, mode, content.len() as u64, None)
                .map_err(|e| ExecError::Transfer(e.to_string()))?;
            channel
                .write_all(&content)
                .map_err(|e| ExecError::Transfer(e.to_string()))?;
            channel
                .send_eof()
                .and_then(|_| channel.wait_eof())
                .and_then(|_| channel.close())
                .and_then(|_| channel.wait_close())
                .map_err(|e| ExecError::Transfer(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| ExecError::Transfer(format!("scp task failed: {e}")))?
    }

    async fn scp_recv(&self, remote_path: &Path) -> Result<Vec<u8>, ExecError> {
        let session = Arc::clone(&self.session);
        let remote_path = remote_path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let session = session.lock();
            let (mut channel, stat) = session
                .scp_recv(&remote_path)
                .map_err(|e| ExecError::Transfer(e.to_string()))?;
            let mut content = Vec::with_capacity(stat.size() as usize);
            channel
                .read_to_end(&mut content)
                .map_err(|e| ExecError::Transfer(e.to_string()))?;
            Ok(content)
        })
        .await
        .map_err(|e| ExecError::Transfer(format!("scp task failed: {e}")))?
    }

    /// Remote temp path for sudo-staged transfers.
    fn stage_path() -> PathBuf {
        PathBuf::from(format!(
            "/tmp/.nexus-stage-{}",
            uuid::Uuid::new_v4().simple()
        ))
    }

    async fn sudo_move_into_place(
        &self,
        staged: &Path,
        dest: &Path,
        mode: Option<u32>,
    ) -> Result<(), ExecError> {
        let mut cmd = format!("mv {} {}", sh_quote_path(staged), sh_quote_path(dest));
        if let Some(mode) = mode {
            cmd.push_str(&format!(" && chmod {:o} {}", mode, sh_quote_path(dest)));
        }
        let output = self
            .exec(&cmd, &HashMap::new(), Duration::from_secs(60), true)
            .await?;
        if output.exit_code != 0 {
            return Err(ExecError::Transfer(output.text()));
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for SshConnection {
    fn host_name(&self) -> &str {
        &self.host_name
    }

    async fn exec_streaming(
        &self,
        cmd: &str,
        env: &HashMap<String, String>,
        timeout: Duration,
        sudo: bool,
        on_chunk: ChunkFn,
    ) -> Result<i32, ExecError> {
        let wrapped = if sudo {
            wrap_sudo(&wrap_command(cmd, env))
        } else {
            wrap_command(cmd, env)
        };
        tracing::trace!(host = %self.host_name, addr = %self.addr, %wrapped, "ssh exec");
        let output = self.exec_raw(&wrapped, timeout, Some(on_chunk)).await?;
        if sudo && Self::detect_sudo_password(&output) {
            return Err(ExecError::SudoPasswordRequired);
        }
        Ok(output.exit_code)
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
        let scp_mode = mode.map(|m| m as i32).unwrap_or(0o644);
        if sudo {
            let staged = Self::stage_path();
            self.scp_send(&staged, content.to_vec(), 0o600).await?;
            self.sudo_move_into_place(&staged, path, mode).await
        } else {
            self.scp_send(path, content.to_vec(), scp_mode).await
        }
    }

    async fn read_file(&self, path: &Path, sudo: bool) -> Result<Option<Vec<u8>>, ExecError> {
        if sudo {
            let cmd = format!("cat {}", sh_quote_path(path));
            let output = self
                .exec(&cmd, &HashMap::new(), Duration::from_secs(60), true)
                .await?;
            if output.exit_code == 0 {
                Ok(Some(output.output))
            } else {
                Ok(None)
            }
        } else {
            match self.scp_recv(path).await {
                Ok(content) => Ok(Some(content)),
                Err(ExecError::Transfer(_)) => Ok(None),
                Err(e) => Err(e),
            }
        }
    }
}

#[cfg(test)]
#[path = "ssh_tests.rs"]
mod tests;
