// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fact gathering
//!
//! One fixed discovery script runs per host; its output is split into
//! marker-delimited blocks and parsed leniently. A field that cannot be
//! discovered gets its default, never an error: facts exist to inform
//! `when:` predicates, not to gate execution.

use crate::connection::{Connection, ExecError};
use nexus_core::facts::{memory_mb_from_meminfo, os_family_from_os_release, os_version_from_os_release};
use nexus_core::Facts;
use std::collections::HashMap;
use std::time::Duration;

/// Discovery script. Each section is tolerant of missing tools; `nproc`
/// falls back to BSD `sysctl`, `/proc/meminfo` to `hw.memsize`.
pub const GATHER_SCRIPT: &str = r#"echo '===os'; uname -s
echo '===kernel'; uname -r
echo '===arch'; uname -m
echo '===hostname'; hostname 2>/dev/null
echo '===fqdn'; hostname -f 2>/dev/null
echo '===cpu'; nproc 2>/dev/null || sysctl -n hw.ncpu 2>/dev/null
echo '===mem'; cat /proc/meminfo 2>/dev/null || sysctl -n hw.memsize 2>/dev/null
echo '===osrelease'; cat /etc/os-release 2>/dev/null
echo '===user'; id -un 2>/dev/null"#;

const GATHER_TIMEOUT: Duration = Duration::from_secs(30);

fn split_blocks(output: &str) -> HashMap<&str, String> {
    let mut blocks = HashMap::new();
    let mut current: Option<&str> = None;
    let mut text = String::new();
    for line in output.lines() {
        if let Some(name) = line.strip_prefix("===") {
            if let Some(prev) = current.take() {
                blocks.insert(prev, std::mem::take(&mut text));
            }
            current = Some(name.trim());
        } else if current.is_some() {
            text.push_str(line);
            text.push('\n');
        }
    }
    if let Some(prev) = current {
        blocks.insert(prev, text);
    }
    blocks
}

fn first_line(blocks: &HashMap<&str, String>, key: &str) -> Option<String> {
    blocks
        .get(key)
        .and_then(|b| b.lines().next())
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}

/// Parse discovery-script output into facts. Pure; missing blocks default.
pub fn facts_from_blocks(output: &str) -> Facts {
    let blocks = split_blocks(output);
    let mut facts = Facts::default();

    if let Some(os) = first_line(&blocks, "os") {
        facts.os = os.to_ascii_lowercase();
    }
    if let Some(kernel) = first_line(&blocks, "kernel") {
        facts.kernel_version = kernel;
    }
    if let Some(arch) = first_line(&blocks, "arch") {
        facts.arch = arch;
    }
    if let Some(hostname) = first_line(&blocks, "hostname") {
        facts.hostname = hostname;
    }
    if let Some(fqdn) = first_line(&blocks, "fqdn") {
        facts.fqdn = fqdn;
    }
    if let Some(user) = first_line(&blocks, "user") {
        facts.user = user;
    }
    if let Some(cpu) = first_line(&blocks, "cpu") {
        facts.cpu_count = cpu.parse().unwrap_or(0);
    }

    if let Some(mem) = blocks.get("mem") {
        if mem.contains("MemTotal") {
            facts.memory_mb = memory_mb_from_meminfo(mem);
        } else if let Some(bytes) = mem.lines().next().and_then(|l| l.trim().parse::<u64>().ok())
        {
            facts.memory_mb = bytes / (1024 * 1024);
        }
    }

    if facts.os == "darwin" {
        facts.os_family = "darwin".to_string();
    } else if let Some(release) = blocks.get("osrelease") {
        facts.os_family = os_family_from_os_release(release);
        facts.os_version = os_version_from_os_release(release);
    }

    facts
}

/// Run the discovery script over a connection and parse the result.
pub async fn gather(conn: &dyn Connection) -> Result<Facts, ExecError> {
    let output = conn
        .exec(GATHER_SCRIPT, &HashMap::new(), GATHER_TIMEOUT, false)
        .await?;
    let mut facts = facts_from_blocks(&output.text());
    if facts.hostname == "unknown" {
        facts.hostname = conn.host_name().to_string();
    }
    tracing::debug!(
        host = conn.host_name(),
        os = %facts.os,
        os_family = %facts.os_family,
        cpu_count = facts.cpu_count,
        "gathered facts"
    );
    Ok(facts)
}

/// Facts about the control machine itself. Never fails.
pub fn gather_local() -> Facts {
    let mut facts = Facts {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        ..Facts::default()
    };

    if let Ok(name) = hostname::get() {
        facts.hostname = name.to_string_lossy().into_owned();
    }
    if let Ok(n) = std::thread::available_parallelism() {
        facts.cpu_count = n.get() as u32;
    }
    if let Ok(user) = std::env::var("USER") {
        if !user.is_empty() {
            facts.user = user;
        }
    }

    if facts.os == "macos" {
        facts.os = "darwin".to_string();
        facts.os_family = "darwin".to_string();
    } else if let Ok(release) = std::fs::read_to_string("/etc/os-release") {
        facts.os_family = os_family_from_os_release(&release);
        facts.os_version = os_version_from_os_release(&release);
    }
    if let Ok(meminfo) = std::fs::read_to_string("/proc/meminfo") {
        facts.memory_mb = memory_mb_from_meminfo(&meminfo);
    }

    facts
}

#[cfg(test)]
#[path = "facts_tests.rs"]
mod tests;
