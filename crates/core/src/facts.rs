// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host-discovered attributes
//!
//! Facts are gathered lazily on first reference and cached for the duration
//! of one pipeline run. Gathering lives in the adapters crate; this module
//! holds the value type and the pure parsing helpers so they stay testable
//! without a host.

use crate::condition::Value;
use serde::{Deserialize, Serialize};

/// Fixed-key attribute map for one host.
///
/// Missing fields default to `"unknown"` (strings) or `0` (numerics)
/// rather than failing gathering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facts {
    pub os: String,
    pub os_family: String,
    pub os_version: String,
    pub hostname: String,
    pub fqdn: String,
    pub cpu_count: u32,
    pub memory_mb: u64,
    pub arch: String,
    pub kernel_version: String,
    pub user: String,
}

impl Default for Facts {
    fn default() -> Self {
        let unknown = || "unknown".to_string();
        Self {
            os: unknown(),
            os_family: unknown(),
            os_version: unknown(),
            hostname: unknown(),
            fqdn: unknown(),
            cpu_count: 0,
            memory_mb: 0,
            arch: unknown(),
            kernel_version: unknown(),
            user: unknown(),
        }
    }
}

impl Facts {
    /// Look up a fact by key for `when:` evaluation. `None` for unknown keys.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "os" => Some(Value::Str(self.os.clone())),
            "os_family" => Some(Value::Str(self.os_family.clone())),
            "os_version" => Some(Value::Str(self.os_version.clone())),
            "hostname" => Some(Value::Str(self.hostname.clone())),
            "fqdn" => Some(Value::Str(self.fqdn.clone())),
            "cpu_count" => Some(Value::Int(self.cpu_count as i64)),
            "memory_mb" => Some(Value::Int(self.memory_mb as i64)),
            "arch" => Some(Value::Str(self.arch.clone())),
            "kernel_version" => Some(Value::Str(self.kernel_version.clone())),
            "user" => Some(Value::Str(self.user.clone())),
            _ => None,
        }
    }
}

const DEBIAN_FAMILY: &[&str] = &["debian", "ubuntu", "linuxmint", "raspbian", "pop"];
const RHEL_FAMILY: &[&str] = &["rhel", "centos", "fedora", "rocky", "alma", "oracle"];
const ARCH_FAMILY: &[&str] = &["arch", "manjaro", "endeavouros"];
const SUSE_FAMILY: &[&str] = &["opensuse", "suse", "sles"];

fn family_of(id: &str) -> Option<&'static str> {
    let id = id.trim().trim_matches('"').to_ascii_lowercase();
    // opensuse ships ids like "opensuse-leap"
    let base = id.split('-').next().unwrap_or(&id);
    if DEBIAN_FAMILY.contains(&base) {
        Some("debian")
    } else if RHEL_FAMILY.contains(&base) {
        Some("rhel")
    } else if ARCH_FAMILY.contains(&base) {
        Some("arch")
    } else if SUSE_FAMILY.contains(&base) {
        Some("suse")
    } else if base == "alpine" {
        Some("alpine")
    } else {
        None
    }
}

/// Derive `os_family` from `/etc/os-release` contents.
///
/// `ID_LIKE` wins over `ID`; each ID_LIKE token is tried in order. Unmapped
/// ids fall back to the raw `ID` value, or `"unknown"` when absent.
pub fn os_family_from_os_release(content: &str) -> String {
    let mut id = None;
    let mut id_like = None;
    for line in content.lines() {
        if let Some(v) = line.strip_prefix("ID=") {
            id = Some(v.trim().trim_matches('"').to_string());
        } else if let Some(v) = line.strip_prefix("ID_LIKE=") {
            id_like = Some(v.trim().trim_matches('"').to_string());
        }
    }

    if let Some(like) = &id_like {
        for token in like.split_whitespace() {
            if let Some(family) = family_of(token) {
                return family.to_string();
            }
        }
    }
    if let Some(id) = &id {
        if let Some(family) = family_of(id) {
            return family.to_string();
        }
        if !id.is_empty() {
            return id.to_ascii_lowercase();
        }
    }
    "unknown".to_string()
}

/// Parse `MemTotal` out of `/proc/meminfo` contents, in megabytes.
pub fn memory_mb_from_meminfo(content: &str) -> u64 {
    content
        .lines()
        .find_map(|line| {
            let rest = line.strip_prefix("MemTotal:")?;
            let kb: u64 = rest.split_whitespace().next()?.parse().ok()?;
            Some(kb / 1024)
        })
        .unwrap_or(0)
}

/// Parse `VERSION_ID` out of `/etc/os-release` contents.
pub fn os_version_from_os_release(content: &str) -> String {
    content
        .lines()
        .find_map(|line| line.strip_prefix("VERSION_ID="))
        .map(|v| v.trim().trim_matches('"').to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
#[path = "facts_tests.rs"]
mod tests;
