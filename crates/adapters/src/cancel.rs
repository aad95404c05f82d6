// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative cancellation
//!
//! One token per pipeline run. Executors select on it mid-step: local
//! children get SIGTERM, then SIGKILL after a grace period; SSH execs
//! return early and let the session timeout reap the channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation is signalled.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        let notified = self.notify.notified();
        // Check again to close the race with cancel() between the load and
        // registering the waiter.
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Resolves on cancellation; pends forever when no token is present.
pub async fn wait_cancelled(token: &Option<Arc<CancelToken>>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
