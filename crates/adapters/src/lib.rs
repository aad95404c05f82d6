// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nexus-adapters: Command execution against local and remote hosts
//!
//! The engine drives everything through the [`Connection`] trait; this crate
//! provides the local-process and SSH implementations, the per-host
//! connection pool, and fact gathering.

pub mod cancel;
pub mod connection;
pub mod facts;
pub mod local;
pub mod output;
pub mod quote;
pub mod ssh;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use cancel::CancelToken;
pub use connection::{Connection, ExecError};
pub use local::LocalConnection;
pub use output::{buffer_chunks, ChunkFn, ChunkSource, ExecOutput, OutputChunk};
pub use quote::sh_quote;
pub use ssh::pool::{Pool, PoolError, PooledConn};
pub use ssh::{ConnectError, ConnectOptions, SshConnection};
