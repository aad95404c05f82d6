// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-pipeline facts cache
//!
//! Owned by one pipeline run and passed down explicitly; never a process
//! global, so pipelines running in parallel (and tests) cannot cross-talk.
//! Facts are gathered lazily on first reference and kept for the rest of
//! the run.

use nexus_core::Facts;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct FactsCache {
    inner: Mutex<HashMap<String, Facts>>,
}

impl FactsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, host_id: &str) -> Option<Facts> {
        self.inner.lock().get(host_id).cloned()
    }

    pub fn put(&self, host_id: impl Into<String>, facts: Facts) {
        self.inner.lock().insert(host_id.into(), facts);
    }

    /// Cached facts for the host, or gather-and-cache via `gather`.
    ///
    /// The lock is not held across the gather await; two tasks racing on
    /// one host may both gather, last write wins. Facts are stable within a
    /// run, so that is merely redundant work, not a correctness issue.
    pub async fn get_or_gather<F, Fut, E>(&self, host_id: &str, gather: F) -> Result<Facts, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Facts, E>>,
    {
        if let Some(facts) = self.get(host_id) {
            return Ok(facts);
        }
        let facts = gather().await?;
        self.put(host_id, facts.clone());
        Ok(facts)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
#[path = "facts_cache_tests.rs"]
mod tests;
