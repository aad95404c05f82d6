// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telemetry event types
//!
//! Events are plain records emitted synchronously at every execution
//! boundary. Serializes with `{"type": "topic:name", ...fields}` format so
//! sinks that forward to JSON consumers need no mapping layer.

use crate::id::PipelineId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "pipeline:start")]
    PipelineStart {
        pipeline_id: PipelineId,
        tasks: Vec<String>,
    },

    #[serde(rename = "pipeline:stop")]
    PipelineStop {
        pipeline_id: PipelineId,
        duration_ms: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    #[serde(rename = "task:start")]
    TaskStart {
        pipeline_id: PipelineId,
        task: String,
        host: String,
    },

    #[serde(rename = "task:stop")]
    TaskStop {
        pipeline_id: PipelineId,
        task: String,
        host: String,
        duration_ms: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    #[serde(rename = "command:start")]
    CommandStart {
        pipeline_id: PipelineId,
        task: String,
        host: String,
        command: String,
    },

    #[serde(rename = "command:stop")]
    CommandStop {
        pipeline_id: PipelineId,
        task: String,
        host: String,
        output: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl Event {
    /// The topic string sinks match their patterns against.
    pub fn topic(&self) -> &'static str {
        match self {
            Event::PipelineStart { .. } => "pipeline:start",
            Event::PipelineStop { .. } => "pipeline:stop",
            Event::TaskStart { .. } => "task:start",
            Event::TaskStop { .. } => "task:stop",
            Event::CommandStart { .. } => "command:start",
            Event::CommandStop { .. } => "command:stop",
        }
    }

    pub fn pipeline_id(&self) -> &PipelineId {
        match self {
            Event::PipelineStart { pipeline_id, .. }
            | Event::PipelineStop { pipeline_id, .. }
            | Event::TaskStart { pipeline_id, .. }
            | Event::TaskStop { pipeline_id, .. }
            | Event::CommandStart { pipeline_id, .. }
            | Event::CommandStop { pipeline_id, .. } => pipeline_id,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
