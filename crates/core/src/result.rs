// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline result aggregates

use serde::{Deserialize, Serialize};

/// Overall pipeline outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Ok,
    Error,
}

/// Per-task outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Ok,
    Failed,
    /// `when:` predicate was false on every host
    Skipped,
    /// A transitive dependency failed, so this task never ran
    #[serde(rename = "skipped_due_to_dependency")]
    SkippedDependency,
    /// A prior phase aborted the pipeline before this task's phase
    NotRun,
}

/// Per-host outcome within a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    Ok,
    Failed,
    Skipped,
}

/// Outcome of one step on one host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    /// Set by resource steps: whether apply changed the host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
}

impl CommandResult {
    pub fn skipped(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            exit_code: None,
            output: String::new(),
            error: None,
            duration_ms: 0,
            changed: None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some() || matches!(self.exit_code, Some(code) if code != 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostResult {
    pub host: String,
    pub status: HostStatus,
    pub command_results: Vec<CommandResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task: String,
    pub status: TaskStatus,
    pub host_results: Vec<HostResult>,
}

impl TaskResult {
    pub fn skipped(task: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            task: task.into(),
            status,
            host_results: Vec::new(),
        }
    }
}

/// Aggregate result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub status: RunStatus,
    pub duration_ms: u64,
    pub tasks_run: usize,
    pub tasks_succeeded: usize,
    pub tasks_failed: usize,
    /// Name of the task whose failure aborted the pipeline
    pub aborted_at: Option<String>,
    pub tasks: Vec<TaskResult>,
}

impl PipelineResult {
    /// The stable JSON summary printed by `--format json`.
    pub fn summary_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": self.status,
            "duration_ms": self.duration_ms,
            "tasks_run": self.tasks_run,
            "tasks_succeeded": self.tasks_succeeded,
            "tasks_failed": self.tasks_failed,
            "aborted_at": self.aborted_at,
        })
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
