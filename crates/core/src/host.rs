// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host and host-group bindings

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;

fn default_port() -> u16 {
    22
}

/// How commands reach a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    #[default]
    Ssh,
    /// Run directly on the control machine under this host's name.
    /// Useful for control-node tasks and for exercising multi-host
    /// strategies without a fleet.
    Local,
}

/// A named SSH target. Constructed at config load, read-only thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    /// Symbolic id used by task `on` targets and group membership
    #[serde(default)]
    pub name: String,
    /// Address to connect to (DNS name or IP)
    pub hostname: String,
    /// SSH user; defaults to the invoking user when empty
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path to a private key file; takes precedence over `password`
    #[serde(default)]
    pub identity: Option<PathBuf>,
    /// Opaque password credential, passed through to the SSH layer
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub connection: ConnectionKind,
}

/// An ordered list of host names resolving to a deduplicated set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostGroup {
    #[serde(default)]
    pub name: String,
    pub hosts: Vec<String>,
}

impl HostGroup {
    /// Member host names in declaration order with duplicates collapsed.
    pub fn members(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.hosts
            .iter()
            .map(String::as_str)
            .filter(|h| seen.insert(*h))
            .collect()
    }
}

/// Where a task runs: the local machine or a named host/group.
///
/// Spelled `":local"` or a symbolic name in config; whether a name is a
/// host or a group is resolved against the config at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Local,
    Name(String),
}

impl Default for Target {
    fn default() -> Self {
        Target::Local
    }
}

impl Target {
    pub fn as_str(&self) -> &str {
        match self {
            Target::Local => ":local",
            Target::Name(n) => n,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        if s == ":local" || s == "local" {
            Target::Local
        } else {
            Target::Name(s.to_string())
        }
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(Target::from(s.as_str()))
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
