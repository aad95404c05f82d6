// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The config value consumed by the execution engine

use indexmap::IndexMap;
use nexus_core::{Host, HostGroup, Target, Task};
use std::path::PathBuf;

/// Everything the engine needs for one invocation: hosts, groups, tasks,
/// and handlers, all keyed by name in declaration order.
///
/// Declaration order is semantic: it breaks topological-sort ties and fixes
/// the order notified handlers run in.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub hosts: IndexMap<String, Host>,
    pub groups: IndexMap<String, HostGroup>,
    pub tasks: IndexMap<String, Task>,
    /// Tasks only runnable via resource `notify:` declarations
    pub handlers: IndexMap<String, Task>,
    /// Root for artifacts and run state; defaults to `~/.nexus`
    pub data_dir: Option<PathBuf>,
}

/// A task target resolved against the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget<'a> {
    Local,
    Hosts(Vec<&'a Host>),
}

impl Config {
    /// Expand a target into concrete hosts. Groups resolve in declaration
    /// order with duplicates collapsed; a bare name tries groups first,
    /// then hosts.
    pub fn resolve_target<'a>(&'a self, target: &Target) -> Option<ResolvedTarget<'a>> {
        match target {
            Target::Local => Some(ResolvedTarget::Local),
            Target::Name(name) => {
                if let Some(group) = self.groups.get(name) {
                    let hosts: Vec<&Host> = group
                        .members()
                        .iter()
                        .filter_map(|h| self.hosts.get(*h))
                        .collect();
                    Some(ResolvedTarget::Hosts(hosts))
                } else {
                    self.hosts
                        .get(name)
                        .map(|h| ResolvedTarget::Hosts(vec![h]))
                }
            }
        }
    }

    /// All tasks in declaration order.
    pub fn task_list(&self) -> Vec<&Task> {
        self.tasks.values().collect()
    }

    /// The starter config written by `nexus init`.
    pub fn template() -> &'static str {
        r#"# Nexus configuration
#
# Declare hosts, groups, and tasks, then run:
#   nexus run <task...>

[hosts.web1]
hostname = "203.0.113.10"
user = "deploy"
# identity = "~/.ssh/id_ed25519"

[groups.web]
hosts = ["web1"]

[tasks.build]
on = ":local"

[[tasks.build.steps]]
type = "shell"
cmd = "echo building"

[tasks.deploy]
on = "web"
deps = ["build"]
strategy = "rolling"
rolling_batch = 1

[[tasks.deploy.steps]]
type = "shell"
cmd = "echo deploying"

[handlers.reload-nginx]
on = "web"

[[handlers.reload-nginx.steps]]
type = "shell"
cmd = "systemctl reload nginx"
sudo = true
"#
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
