// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TOML config loading
//!
//! Raw serde structs mirror the file format; conversion injects map keys as
//! names and lowers `when:` clauses into [`nexus_core::Condition`] trees.

use crate::config::Config;
use indexmap::IndexMap;
use nexus_core::{Condition, Host, HostGroup, Step, StepAction, Strategy, Target, Task, Value};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
}

/// Structured `when:` clause as written in config.
///
/// ```toml
/// when = { fact = "os_family", eq = "debian" }
/// when = { fact = "cpu_count", gt = 4 }
/// when = { fact = "os_family", in = ["debian", "rhel"] }
/// when = { all = [{ fact = "os", eq = "linux" }, { fact = "arch", ne = "armv7l" }] }
/// when = { not = { fact = "os_family", eq = "alpine" } }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WhenClause {
    #[serde(default)]
    pub fact: Option<String>,
    #[serde(default)]
    pub eq: Option<toml::Value>,
    #[serde(default)]
    pub ne: Option<toml::Value>,
    #[serde(default)]
    pub lt: Option<toml::Value>,
    #[serde(default)]
    pub gt: Option<toml::Value>,
    #[serde(default)]
    pub le: Option<toml::Value>,
    #[serde(default)]
    pub ge: Option<toml::Value>,
    #[serde(default, rename = "in")]
    pub within: Option<Vec<toml::Value>>,
    #[serde(default)]
    pub all: Option<Vec<WhenClause>>,
    #[serde(default)]
    pub any: Option<Vec<WhenClause>>,
    #[serde(default)]
    pub not: Option<Box<WhenClause>>,
}

fn lower_value(v: &toml::Value) -> Value {
    match v {
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Integer(n) => Value::Int(*n),
        toml::Value::Float(f) => Value::Float(*f),
        toml::Value::String(s) => Value::Str(s.clone()),
        toml::Value::Array(items) => Value::List(items.iter().map(lower_value).collect()),
        other => Value::Str(other.to_string()),
    }
}

fn conjoin(mut conds: Vec<Condition>, or: bool) -> Condition {
    // An empty all/any list is vacuously true.
    let Some(first) = conds.pop() else {
        return Condition::Literal(Value::Bool(true));
    };
    conds.into_iter().rev().fold(first, |acc, c| {
        if or {
            Condition::Or(Box::new(c), Box::new(acc))
        } else {
            Condition::And(Box::new(c), Box::new(acc))
        }
    })
}

impl WhenClause {
    /// Lower the clause into a condition tree.
    pub fn lower(&self) -> Condition {
        let mut conds = Vec::new();

        if let Some(children) = &self.all {
            conds.push(conjoin(children.iter().map(WhenClause::lower).collect(), false));
        }
        if let Some(children) = &self.any {
            conds.push(conjoin(children.iter().map(WhenClause::lower).collect(), true));
        }
        if let Some(child) = &self.not {
            conds.push(Condition::Not(Box::new(child.lower())));
        }

        if let Some(fact) = &self.fact {
            let lhs = || Box::new(Condition::FactRef(fact.clone()));
            let lit = |v: &toml::Value| Box::new(Condition::Literal(lower_value(v)));
            if let Some(v) = &self.eq {
                conds.push(Condition::Eq(lhs(), lit(v)));
            }
            if let Some(v) = &self.ne {
                conds.push(Condition::Ne(lhs(), lit(v)));
            }
            if let Some(v) = &self.lt {
                conds.push(Condition::Lt(lhs(), lit(v)));
            }
            if let Some(v) = &self.gt {
                conds.push(Condition::Gt(lhs(), lit(v)));
            }
            if let Some(v) = &self.le {
                conds.push(Condition::Le(lhs(), lit(v)));
            }
            if let Some(v) = &self.ge {
                conds.push(Condition::Ge(lhs(), lit(v)));
            }
            if let Some(items) = &self.within {
                conds.push(Condition::In(
                    lhs(),
                    Box::new(Condition::Literal(Value::List(
                        items.iter().map(lower_value).collect(),
                    ))),
                ));
            }
            // `when = { fact = "x" }` with no operator: truthiness of the fact
            if conds.is_empty() {
                conds.push(Condition::FactRef(fact.clone()));
            }
        }

        conjoin(conds, false)
    }
}

// No deny_unknown_fields here: it cannot be combined with flatten.
#[derive(Debug, Deserialize)]
struct RawStep {
    #[serde(flatten)]
    action: StepAction,
    #[serde(default)]
    when: Option<WhenClause>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTask {
    #[serde(default)]
    on: Target,
    #[serde(default)]
    steps: Vec<RawStep>,
    #[serde(default)]
    deps: Vec<String>,
    #[serde(default)]
    strategy: Strategy,
    #[serde(default)]
    rolling_batch: Option<usize>,
    #[serde(default)]
    when: Option<WhenClause>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    artifacts: Vec<nexus_core::ArtifactDecl>,
}

impl RawTask {
    fn lower(self, name: &str) -> Task {
        Task {
            name: name.to_string(),
            on: self.on,
            steps: self
                .steps
                .into_iter()
                .map(|s| Step {
                    action: s.action,
                    when: s.when.as_ref().map(WhenClause::lower),
                })
                .collect(),
            deps: self.deps,
            strategy: self.strategy,
            rolling_batch: self.rolling_batch,
            when: self.when.as_ref().map(WhenClause::lower),
            tags: self.tags,
            artifacts: self.artifacts,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    data_dir: Option<PathBuf>,
    #[serde(default)]
    hosts: IndexMap<String, Host>,
    #[serde(default)]
    groups: IndexMap<String, HostGroup>,
    #[serde(default)]
    tasks: IndexMap<String, RawTask>,
    #[serde(default)]
    handlers: IndexMap<String, RawTask>,
}

impl RawConfig {
    fn lower(self) -> Config {
        Config {
            hosts: self
                .hosts
                .into_iter()
                .map(|(name, mut host)| {
                    host.name = name.clone();
                    (name, host)
                })
                .collect(),
            groups: self
                .groups
                .into_iter()
                .map(|(name, mut group)| {
                    group.name = name.clone();
                    (name, group)
                })
                .collect(),
            tasks: self
                .tasks
                .into_iter()
                .map(|(name, raw)| {
                    let task = raw.lower(&name);
                    (name, task)
                })
                .collect(),
            handlers: self
                .handlers
                .into_iter()
                .map(|(name, raw)| {
                    let task = raw.lower(&name);
                    (name, task)
                })
                .collect(),
            data_dir: self.data_dir,
        }
    }
}

impl Config {
    /// Load and lower a TOML config file.
    pub fn load(path: &Path) -> Result<Config, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Config::parse(&text).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        tracing::debug!(
            path = %path.display(),
            hosts = config.hosts.len(),
            tasks = config.tasks.len(),
            handlers = config.handlers.len(),
            "loaded config"
        );
        Ok(config)
    }

    /// Parse config text. Exposed for tests and `validate`.
    pub fn parse(text: &str) -> Result<Config, toml::de::Error> {
        let raw: RawConfig = toml::from_str(text)?;
        Ok(raw.lower())
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
