// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nexus-store: Filesystem-backed artifact storage
//!
//! Artifacts are named files produced by one task and consumed by its
//! dependents, isolated per pipeline run under
//! `<data_dir>/artifacts/<pipeline_id>/`.

pub mod artifacts;

pub use artifacts::{Artifact, ArtifactStore, StoreError};
