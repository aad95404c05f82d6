// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nexus-engine: The execution engine
//!
//! Builds a DAG over the configured tasks, schedules it into parallel
//! phases, and drives steps across hosts through the adapters, emitting
//! telemetry at every boundary.

pub mod dag;
pub mod error;
pub mod facts_cache;
pub mod interpreter;
pub mod providers;
pub mod runner;
pub mod telemetry;
pub mod waitfor;

pub use dag::{Graph, GraphError};
pub use error::RunError;
pub use facts_cache::FactsCache;
pub use interpreter::Interpreter;
pub use providers::{ApplyResult, ApplyState, Diff, Provider, ProviderContext, ProviderRegistry};
pub use runner::{Plan, RunOptions, Runner};
pub use telemetry::TelemetryBus;
