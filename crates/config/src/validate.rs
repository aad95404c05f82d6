// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-reference validation
//!
//! Checks every symbolic reference in a loaded config. All problems are
//! collected and returned together so the operator fixes one pass, not one
//! error at a time. Cycle detection is the DAG's job, not this module's.

use crate::config::Config;
use nexus_core::{StepAction, Strategy, Target, Task};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

#[allow(clippy::expect_used)]
static ARTIFACT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("constant regex pattern is valid"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidateError {
    #[error("task {task}: dependency {dep} is not a declared task")]
    UnknownDep { task: String, dep: String },
    #[error("task {task}: target {target} is not a declared host or group")]
    UnknownTarget { task: String, target: String },
    #[error("group {group}: member {host} is not a declared host")]
    UnknownGroupMember { group: String, host: String },
    #[error("task {task}: notify target {handler} is not a declared handler")]
    UnknownHandler { task: String, handler: String },
    #[error("task {task}: rolling strategy requires rolling_batch")]
    MissingRollingBatch { task: String },
    #[error("task {task}: invalid artifact name {name:?}")]
    InvalidArtifactName { task: String, name: String },
}

fn check_task(config: &Config, task: &Task, errors: &mut Vec<ValidateError>) {
    if let Target::Name(name) = &task.on {
        if !config.groups.contains_key(name) && !config.hosts.contains_key(name) {
            errors.push(ValidateError::UnknownTarget {
                task: task.name.clone(),
                target: name.clone(),
            });
        }
    }

    for dep in &task.deps {
        if !config.tasks.contains_key(dep) {
            errors.push(ValidateError::UnknownDep {
                task: task.name.clone(),
                dep: dep.clone(),
            });
        }
    }

    if task.strategy == Strategy::Rolling && task.rolling_batch.is_none() {
        errors.push(ValidateError::MissingRollingBatch {
            task: task.name.clone(),
        });
    }

    for step in &task.steps {
        let notify = match &step.action {
            StepAction::Template { notify, .. } => notify.as_deref(),
            StepAction::Resource { spec, .. } => spec.notify(),
            _ => None,
        };
        if let Some(handler) = notify {
            if !config.handlers.contains_key(handler) {
                errors.push(ValidateError::UnknownHandler {
                    task: task.name.clone(),
                    handler: handler.to_string(),
                });
            }
        }
    }

    for artifact in &task.artifacts {
        let name = &artifact.name;
        if !ARTIFACT_NAME.is_match(name) || name.len() > 255 || name.contains("..") {
            errors.push(ValidateError::InvalidArtifactName {
                task: task.name.clone(),
                name: name.clone(),
            });
        }
    }
}

/// Check every reference in the config; returns all problems found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidateError>> {
    let mut errors = Vec::new();

    for group in config.groups.values() {
        for host in &group.hosts {
            if !config.hosts.contains_key(host) {
                errors.push(ValidateError::UnknownGroupMember {
                    group: group.name.clone(),
                    host: host.clone(),
                });
            }
        }
    }

    for task in config.tasks.values() {
        check_task(config, task, &mut errors);
    }
    for handler in config.handlers.values() {
        check_task(config, handler, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
