// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative resource specifications
//!
//! A resource names a desired state (present/absent/running/...) plus
//! type-specific attributes. Realizing one is the job of a provider in the
//! engine; the spec itself is a plain value so configs stay serializable.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Desired presence for files, directories, users, and groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    #[default]
    Present,
    Absent,
}

/// Desired state for packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageState {
    #[default]
    Present,
    Absent,
    /// Upgrade to the newest available version
    Latest,
}

/// Desired state for services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    #[default]
    Running,
    Stopped,
}

/// A declarative, idempotent resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResourceSpec {
    File {
        path: PathBuf,
        /// Inline content; mutually exclusive with `source`
        #[serde(default)]
        content: Option<String>,
        /// Local file to copy content from
        #[serde(default)]
        source: Option<PathBuf>,
        #[serde(default)]
        owner: Option<String>,
        #[serde(default)]
        group: Option<String>,
        #[serde(default)]
        mode: Option<u32>,
        #[serde(default)]
        state: DesiredState,
        #[serde(default)]
        notify: Option<String>,
    },
    Directory {
        path: PathBuf,
        #[serde(default)]
        owner: Option<String>,
        #[serde(default)]
        group: Option<String>,
        #[serde(default)]
        mode: Option<u32>,
        #[serde(default)]
        state: DesiredState,
        #[serde(default)]
        notify: Option<String>,
    },
    Package {
        name: String,
        #[serde(default)]
        version: Option<String>,
        #[serde(default)]
        state: PackageState,
        #[serde(default)]
        notify: Option<String>,
    },
    Service {
        name: String,
        #[serde(default)]
        state: ServiceState,
        /// Enable/disable at boot; `None` leaves it untouched
        #[serde(default)]
        enabled: Option<bool>,
        #[serde(default)]
        notify: Option<String>,
    },
    User {
        name: String,
        #[serde(default)]
        uid: Option<u32>,
        #[serde(default)]
        group: Option<String>,
        #[serde(default)]
        groups: Vec<String>,
        #[serde(default)]
        shell: Option<String>,
        #[serde(default)]
        home: Option<PathBuf>,
        #[serde(default)]
        system: bool,
        #[serde(default)]
        state: DesiredState,
        #[serde(default)]
        notify: Option<String>,
    },
    Group {
        name: String,
        #[serde(default)]
        gid: Option<u32>,
        #[serde(default)]
        system: bool,
        #[serde(default)]
        state: DesiredState,
        #[serde(default)]
        notify: Option<String>,
    },
    /// A command with idempotence guards
    Command {
        command: String,
        /// Skip as unchanged when this path exists
        #[serde(default)]
        creates: Option<PathBuf>,
        /// Skip as unchanged when this path is absent
        #[serde(default)]
        removes: Option<PathBuf>,
        /// Skip when this shell condition exits 0
        #[serde(default)]
        unless: Option<String>,
        /// Skip when this shell condition exits non-zero
        #[serde(default)]
        onlyif: Option<String>,
        #[serde(default)]
        notify: Option<String>,
    },
}

impl ResourceSpec {
    /// The `kind` discriminant as it appears in config.
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceSpec::File { .. } => "file",
            ResourceSpec::Directory { .. } => "directory",
            ResourceSpec::Package { .. } => "package",
            ResourceSpec::Service { .. } => "service",
            ResourceSpec::User { .. } => "user",
            ResourceSpec::Group { .. } => "group",
            ResourceSpec::Command { .. } => "command",
        }
    }

    /// Handler name to notify when applying this resource changes the host.
    pub fn notify(&self) -> Option<&str> {
        match self {
            ResourceSpec::File { notify, .. }
            | ResourceSpec::Directory { notify, .. }
            | ResourceSpec::Package { notify, .. }
            | ResourceSpec::Service { notify, .. }
            | ResourceSpec::User { notify, .. }
            | ResourceSpec::Group { notify, .. }
            | ResourceSpec::Command { notify, .. } => notify.as_deref(),
        }
    }

    /// Short description used in results and telemetry.
    pub fn describe(&self) -> String {
        match self {
            ResourceSpec::File { path, state, .. } => {
                format!("file[{}] {:?}", path.display(), state)
            }
            ResourceSpec::Directory { path, state, .. } => {
                format!("directory[{}] {:?}", path.display(), state)
            }
            ResourceSpec::Package { name, state, .. } => format!("package[{name}] {state:?}"),
            ResourceSpec::Service { name, state, .. } => format!("service[{name}] {state:?}"),
            ResourceSpec::User { name, state, .. } => format!("user[{name}] {state:?}"),
            ResourceSpec::Group { name, state, .. } => format!("group[{name}] {state:?}"),
            ResourceSpec::Command { command, .. } => format!("command[{command}]"),
        }
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
