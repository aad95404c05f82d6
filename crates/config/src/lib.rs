// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nexus-config: Config loading, validation, and template rendering
//!
//! The execution engine consumes a [`Config`] value; this crate is the thin
//! surface that produces one from a TOML file and checks its internal
//! references. Anything richer (host discovery, alternative formats) sits
//! outside the engine and populates `Config` before execution begins.

pub mod config;
pub mod loader;
pub mod template;
pub mod validate;

pub use config::{Config, ResolvedTarget};
pub use loader::{LoadError, WhenClause};
pub use template::{render, TemplateError};
pub use validate::{validate, ValidateError};
