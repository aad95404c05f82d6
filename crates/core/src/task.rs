// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task and step definitions

use crate::condition::Condition;
use crate::host::Target;
use crate::resource::ResourceSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// How a task fans out across its bound hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// All hosts concurrently
    #[default]
    Parallel,
    /// Hosts in declared order, abort on first failure
    Sequential,
    /// Chunks of `rolling_batch`; a failed batch halts later batches
    Rolling,
}

/// Default shell step timeout (spec: 300 s per command step).
pub const DEFAULT_STEP_TIMEOUT_SECS: u64 = 300;

fn default_step_timeout() -> u64 {
    DEFAULT_STEP_TIMEOUT_SECS
}

fn default_wait_timeout_ms() -> u64 {
    30_000
}

fn default_wait_interval_ms() -> u64 {
    1_000
}

/// What a `wait_for` step polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitForKind {
    /// HTTP GET against `target`; 2xx (or `expected_status`) passes
    Http,
    /// TCP connect to `target` as `host:port`
    Tcp,
    /// Shell command on the step's host; exit 0 passes
    Command,
}

/// Poll `target` at `interval_ms` until it matches or `timeout_ms` elapses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitForSpec {
    #[serde(rename = "wait")]
    pub kind: WaitForKind,
    pub target: String,
    #[serde(default = "default_wait_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_wait_interval_ms")]
    pub interval_ms: u64,
    /// Exact HTTP status to accept instead of any 2xx
    #[serde(default)]
    pub expected_status: Option<u16>,
    /// Substring or regex the HTTP body must contain
    #[serde(default)]
    pub expected_body: Option<String>,
}

/// A single imperative action on a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepAction {
    /// Run a command through `sh -c`
    Shell {
        cmd: String,
        #[serde(default)]
        env: HashMap<String, String>,
        #[serde(default = "default_step_timeout")]
        timeout_secs: u64,
        #[serde(default)]
        sudo: bool,
    },
    /// Copy a local file to the host
    Upload {
        local_path: PathBuf,
        remote_path: PathBuf,
        #[serde(default)]
        mode: Option<u32>,
        #[serde(default)]
        sudo: bool,
    },
    /// Copy a remote file back to the control machine
    Download {
        remote_path: PathBuf,
        local_path: PathBuf,
        #[serde(default)]
        sudo: bool,
    },
    /// Render a local template, then upload the result
    Template {
        source_path: PathBuf,
        destination: PathBuf,
        #[serde(default)]
        vars: HashMap<String, String>,
        #[serde(default)]
        mode: Option<u32>,
        #[serde(default)]
        sudo: bool,
        #[serde(default)]
        notify: Option<String>,
    },
    /// Block until a probe succeeds
    WaitFor(WaitForSpec),
    /// Declare idempotent state; delegated to a resource provider
    Resource {
        #[serde(flatten)]
        spec: ResourceSpec,
        #[serde(default)]
        sudo: bool,
    },
}

impl StepAction {
    /// Short human-readable description used in results and telemetry.
    pub fn describe(&self) -> String {
        match self {
            StepAction::Shell { cmd, sudo, .. } => {
                if *sudo {
                    format!("shell (sudo): {cmd}")
                } else {
                    format!("shell: {cmd}")
                }
            }
            StepAction::Upload {
                local_path,
                remote_path,
                ..
            } => format!(
                "upload: {} -> {}",
                local_path.display(),
                remote_path.display()
            ),
            StepAction::Download {
                remote_path,
                local_path,
                ..
            } => format!(
                "download: {} -> {}",
                remote_path.display(),
                local_path.display()
            ),
            StepAction::Template {
                source_path,
                destination,
                ..
            } => format!(
                "template: {} -> {}",
                source_path.display(),
                destination.display()
            ),
            StepAction::WaitFor(spec) => {
                let kind = match spec.kind {
                    WaitForKind::Http => "http",
                    WaitForKind::Tcp => "tcp",
                    WaitForKind::Command => "command",
                };
                format!("wait_for {}: {}", kind, spec.target)
            }
            StepAction::Resource { spec, .. } => spec.describe(),
        }
    }
}

/// A step: an action plus an optional `when:` gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: StepAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Condition>,
}

impl Step {
    pub fn new(action: StepAction) -> Self {
        Self { action, when: None }
    }
}

/// A named file a task promises to produce, registered in the artifact store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDecl {
    /// Logical name; must satisfy the store's name validator
    pub name: String,
    /// Local path the file exists at once the task completes
    pub path: PathBuf,
}

/// A named, host-bound list of steps with optional dependencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task name (injected from the config map key)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub on: Target,
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Names of tasks that must complete first
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default)]
    pub strategy: Strategy,
    /// Batch size for the rolling strategy
    #[serde(default)]
    pub rolling_batch: Option<usize>,
    #[serde(default)]
    pub when: Option<Condition>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Artifacts this task produces
    #[serde(default)]
    pub artifacts: Vec<ArtifactDecl>,
}

impl Task {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on: Target::Local,
            steps: Vec::new(),
            deps: Vec::new(),
            strategy: Strategy::Parallel,
            rolling_batch: None,
            when: None,
            tags: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    /// Builder-style helper used heavily in tests.
    pub fn with_shell(mut self, cmd: impl Into<String>) -> Self {
        self.steps.push(Step::new(StepAction::Shell {
            cmd: cmd.into(),
            env: HashMap::new(),
            timeout_secs: DEFAULT_STEP_TIMEOUT_SECS,
            sudo: false,
        }));
        self
    }

    pub fn with_deps(mut self, deps: &[&str]) -> Self {
        self.deps = deps.iter().map(|d| d.to_string()).collect();
        self
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
