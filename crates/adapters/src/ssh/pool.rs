// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded per-host connection pool
//!
//! Slots move `Empty -> Idle -> Checked-Out -> Idle | Dead -> Empty`. The
//! semaphore bounds concurrent checkouts and queues waiters FIFO; the idle
//! list is behind a single mutex. A checked-out connection is never under
//! the pool's lock, and the RAII guard returns it on every exit path,
//! including panics.

use crate::ssh::ConnectError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Default number of connections per host.
pub const DEFAULT_POOL_SIZE: usize = 4;

/// Dead-slot replacement attempts before giving up on an acquisition.
const MAX_REVIVE_ATTEMPTS: usize = 2;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("pool exhausted: no healthy connection after retries")]
    Exhausted,
    #[error("pool is shut down")]
    ShutDown,
    #[error(transparent)]
    Connect(#[from] ConnectError),
}

/// What the pool needs from a pooled connection.
#[async_trait]
pub trait Poolable: Send + Sync + 'static {
    async fn is_alive(&self) -> bool;
    async fn close(&self);
}

/// Creates connections on demand, up to the pool bound.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Conn: Poolable;
    async fn connect(&self) -> Result<Self::Conn, ConnectError>;
}

#[async_trait]
impl Poolable for crate::ssh::SshConnection {
    async fn is_alive(&self) -> bool {
        crate::ssh::SshConnection::is_alive(self).await
    }

    async fn close(&self) {
        crate::ssh::SshConnection::close(self).await;
    }
}

/// Connects to one host with fixed options, with transient-failure retry.
pub struct SshConnector {
    pub host: nexus_core::Host,
    pub opts: crate::ssh::ConnectOptions,
}

#[async_trait]
impl Connector for SshConnector {
    type Conn = crate::ssh::SshConnection;

    async fn connect(&self) -> Result<Self::Conn, ConnectError> {
        crate::ssh::SshConnection::connect_with_retry(&self.host, &self.opts).await
    }
}

/// Bounded pool of reusable connections to one host.
pub struct Pool<C: Connector> {
    connector: C,
    limit: Arc<Semaphore>,
    idle: Mutex<Vec<Arc<C::Conn>>>,
    shut_down: AtomicBool,
}

/// RAII checkout. Deref to the connection; Drop returns it to the pool.
pub struct PooledConn<C: Connector> {
    conn: Option<Arc<C::Conn>>,
    pool: Weak<Pool<C>>,
    _permit: OwnedSemaphorePermit,
}

impl<C: Connector> std::fmt::Debug for PooledConn<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConn")
            .field("has_conn", &self.conn.is_some())
            .finish()
    }
}

impl<C: Connector> Deref for PooledConn<C> {
    type Target = C::Conn;

    fn deref(&self) -> &C::Conn {
        match &self.conn {
            Some(conn) => conn,
            // conn is only taken in Drop; no live guard can get here.
            None => unreachable!("pooled connection already returned"),
        }
    }
}

impl<C: Connector> PooledConn<C> {
    /// Shared handle to the underlying connection.
    pub fn handle(&self) -> Arc<C::Conn> {
        match &self.conn {
            Some(conn) => Arc::clone(conn),
            None => unreachable!("pooled connection already returned"),
        }
    }
}

impl<C: Connector> Drop for PooledConn<C> {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else { return };
        if let Some(pool) = self.pool.upgrade() {
            if !pool.shut_down.load(Ordering::SeqCst) {
                pool.idle.lock().push(conn);
            }
        }
    }
}

impl<C: Connector> Pool<C> {
    pub fn new(connector: C, pool_size: usize) -> Arc<Self> {
        Arc::new(Self {
            connector,
            limit: Arc::new(Semaphore::new(pool_size.max(1))),
            idle: Mutex::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Acquire a healthy connection, creating one lazily up to the bound.
    /// Blocks (FIFO) while all slots are checked out.
    ///
    /// A dead idle connection is closed and replaced; after
    /// [`MAX_REVIVE_ATTEMPTS`] dead slots the acquisition fails with
    /// [`PoolError::Exhausted`]. Creation failures are not cached; the slot
    /// returns to empty so the next caller retries.
    pub async fn acquire(self: &Arc<Self>) -> Result<PooledConn<C>, PoolError> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(PoolError::ShutDown);
        }
        let permit = Arc::clone(&self.limit)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::ShutDown)?;

        let mut revives = 0;
        loop {
            let existing = self.idle.lock().pop();
            let conn = match existing {
                Some(conn) => {
                    if conn.is_alive().await {
                        conn
                    } else {
                        // Dead slot: close, replace, retry the acquisition.
                        conn.close().await;
                        revives += 1;
                        if revives > MAX_REVIVE_ATTEMPTS {
                            return Err(PoolError::Exhausted);
                        }
                        let replacement = Arc::new(self.connector.connect().await?);
                        self.idle.lock().push(replacement);
                        continue;
                    }
                }
                None => Arc::new(self.connector.connect().await?),
            };
            return Ok(PooledConn {
                conn: Some(conn),
                pool: Arc::downgrade(self),
                _permit: permit,
            });
        }
    }

    /// Run `f` with a checked-out connection. The connection is released on
    /// every exit path: success, error, or panic (via the guard's Drop).
    pub async fn with_connection<F, Fut, T>(self: &Arc<Self>, f: F) -> Result<T, PoolError>
    where
        F: FnOnce(Arc<C::Conn>) -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        let guard = self.acquire().await?;
        let result = f(guard.handle()).await;
        drop(guard);
        Ok(result)
    }

    /// Close all idle connections and reject subsequent acquisitions.
    pub async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
        self.limit.close();
        let drained: Vec<Arc<C::Conn>> = std::mem::take(&mut *self.idle.lock());
        for conn in drained {
            conn.close().await;
        }
    }

    /// Number of idle connections (test observability).
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
