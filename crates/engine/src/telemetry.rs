// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process telemetry bus
//!
//! Sinks attach with topic patterns and receive events synchronously, in
//! emission order. Delivery is fire-and-forget: a sink that panics is
//! logged and skipped; a slow sink is the sink's problem (spawn your own
//! task if you need async delivery).

use nexus_core::Event;
use parking_lot::Mutex;
use std::sync::Arc;

/// Sink callback. Invoked inline from the emitting task.
pub type SinkFn = Arc<dyn Fn(&Event) + Send + Sync>;

struct SinkEntry {
    id: String,
    patterns: Vec<String>,
    sink: SinkFn,
}

/// Matches `*`, exact topics (`task:start`), or prefix patterns
/// (`pipeline:*`).
fn pattern_matches(pattern: &str, topic: &str) -> bool {
    if pattern == "*" || pattern == topic {
        return true;
    }
    pattern
        .strip_suffix('*')
        .is_some_and(|prefix| topic.starts_with(prefix))
}

#[derive(Default)]
pub struct TelemetryBus {
    sinks: Mutex<Vec<SinkEntry>>,
}

impl TelemetryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink. Re-attaching an existing id replaces it.
    pub fn attach(
        &self,
        id: impl Into<String>,
        patterns: &[&str],
        sink: SinkFn,
    ) {
        let id = id.into();
        let mut sinks = self.sinks.lock();
        sinks.retain(|entry| entry.id != id);
        sinks.push(SinkEntry {
            id,
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            sink,
        });
    }

    pub fn detach(&self, id: &str) {
        self.sinks.lock().retain(|entry| entry.id != id);
    }

    /// Deliver an event to every matching sink, in attach order.
    pub fn emit(&self, event: &Event) {
        let topic = event.topic();
        let matching: Vec<SinkFn> = {
            let sinks = self.sinks.lock();
            sinks
                .iter()
                .filter(|entry| entry.patterns.iter().any(|p| pattern_matches(p, topic)))
                .map(|entry| Arc::clone(&entry.sink))
                .collect()
        };
        for sink in matching {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sink(event)));
            if result.is_err() {
                tracing::warn!(topic, "telemetry sink panicked; event dropped for that sink");
            }
        }
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.lock().len()
    }
}

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;
