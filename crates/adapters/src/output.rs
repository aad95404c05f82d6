// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streamed command output
//!
//! The streaming API is primary: executors invoke a [`ChunkFn`] as bytes
//! arrive. Buffered results are a thin wrapper that accumulates chunks.

use parking_lot::Mutex;
use std::sync::Arc;

/// Which stream a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSource {
    Stdout,
    Stderr,
}

/// One piece of child output, delivered in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub source: ChunkSource,
    pub data: Vec<u8>,
}

/// Callback invoked for each output chunk. Back-pressure is the callback's
/// responsibility; executors call it inline from the read loop.
pub type ChunkFn = Arc<dyn Fn(OutputChunk) + Send + Sync>;

/// A chunk callback that appends everything into one merged byte buffer,
/// plus the handle to read it back out.
pub fn buffer_chunks() -> (ChunkFn, Arc<Mutex<Vec<u8>>>) {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&buffer);
    let callback: ChunkFn = Arc::new(move |chunk: OutputChunk| {
        sink.lock().extend_from_slice(&chunk.data);
    });
    (callback, buffer)
}

/// Captured output of a completed command.
///
/// A non-zero exit code is a value, not an error: only spawn failure,
/// timeout, or signal-kill surface as `Err` from executors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Merged stdout/stderr in arrival order
    pub output: Vec<u8>,
    pub exit_code: i32,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Lossy UTF-8 view of the merged output.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
