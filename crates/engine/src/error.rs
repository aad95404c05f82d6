// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the execution engine

use thiserror::Error;

/// Errors that abort a pipeline before or during execution.
///
/// Step-level failures are not errors at this level; they are recorded in
/// the pipeline result and steer `aborted_at` / `continue_on_error`.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Graph(#[from] crate::dag::GraphError),
    #[error(transparent)]
    Store(#[from] nexus_store::StoreError),
    #[error("task {task}: target {target} cannot be resolved")]
    UnresolvableTarget { task: String, target: String },
    #[error("internal error: {0}")]
    Internal(String),
}
