// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Package resource provider
//!
//! One provider parameterized by package manager; the registry picks the
//! manager from the host's os_family. `latest` stays idempotent because
//! `check` also probes whether an upgrade is available, so a freshly
//! upgraded package diffs as unchanged.

use super::{sh, CurrentState, Diff, Provider, ProviderContext, ProviderError};
use async_trait::async_trait;
use nexus_adapters::sh_quote;
use nexus_adapters::Connection;
use nexus_core::{PackageState, ResourceSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf,
    Yum,
    Pacman,
    Apk,
    Brew,
}

impl PackageManager {
    /// Exit 0 iff the package is installed.
    fn query(&self, name: &str) -> String {
        let name = sh_quote(name);
        match self {
            PackageManager::Apt => format!(
                "dpkg-query -W -f '${{Status}}' {name} 2>/dev/null | grep -q 'install ok installed'"
            ),
            PackageManager::Dnf | PackageManager::Yum => format!("rpm -q {name} >/dev/null 2>&1"),
            PackageManager::Pacman => format!("pacman -Q {name} >/dev/null 2>&1"),
            PackageManager::Apk => format!("apk info -e {name} >/dev/null 2>&1"),
            PackageManager::Brew => format!("brew list --versions {name} >/dev/null 2>&1"),
        }
    }

    /// Exit 0 iff an upgrade is available.
    fn outdated(&self, name: &str) -> String {
        let name = sh_quote(name);
        match self {
            PackageManager::Apt => {
                format!("apt list --upgradable 2>/dev/null | grep -q \"^{}/\"", trim_quotes(&name))
            }
            PackageManager::Dnf => format!("dnf -q check-update {name} >/dev/null 2>&1; test $? -eq 100"),
            PackageManager::Yum => format!("yum -q check-update {name} >/dev/null 2>&1; test $? -eq 100"),
            PackageManager::Pacman => format!("pacman -Qu {name} >/dev/null 2>&1"),
            PackageManager::Apk => format!("apk version {name} 2>/dev/null | grep -q '<'"),
            PackageManager::Brew => format!("brew outdated --quiet {name} 2>/dev/null | grep -q ."),
        }
    }

    fn install(&self, name: &str, version: Option<&str>) -> String {
        let spec = match (self, version) {
            (PackageManager::Apt, Some(v)) => sh_quote(&format!("{name}={v}")),
            (PackageManager::Dnf | PackageManager::Yum, Some(v)) => {
                sh_quote(&format!("{name}-{v}"))
            }
            _ => sh_quote(name),
        };
        match self {
            PackageManager::Apt => {
                format!("DEBIAN_FRONTEND=noninteractive apt-get install -y {spec}")
            }
            PackageManager::Dnf => format!("dnf install -y {spec}"),
            PackageManager::Yum => format!("yum install -y {spec}"),
            PackageManager::Pacman => format!("pacman -S --noconfirm {spec}"),
            PackageManager::Apk => format!("apk add {spec}"),
            PackageManager::Brew => format!("brew install {spec}"),
        }
    }

    fn upgrade(&self, name: &str) -> String {
        let name = sh_quote(name);
        match self {
            PackageManager::Apt => {
                format!("DEBIAN_FRONTEND=noninteractive apt-get install -y --only-upgrade {name}")
            }
            PackageManager::Dnf => format!("dnf upgrade -y {name}"),
            PackageManager::Yum => format!("yum update -y {name}"),
            PackageManager::Pacman => format!("pacman -S --noconfirm {name}"),
            PackageManager::Apk => format!("apk upgrade {name}"),
            PackageManager::Brew => format!("brew upgrade {name}"),
        }
    }

    fn remove(&self, name: &str) -> String {
        let name = sh_quote(name);
        match self {
            PackageManager::Apt => format!("apt-get remove -y {name}"),
            PackageManager::Dnf => format!("dnf remove -y {name}"),
            PackageManager::Yum => format!("yum remove -y {name}"),
            PackageManager::Pacman => format!("pacman -R --noconfirm {name}"),
            PackageManager::Apk => format!("apk del {name}"),
            PackageManager::Brew => format!("brew uninstall {name}"),
        }
    }
}

fn trim_quotes(s: &str) -> &str {
    s.trim_matches('\'')
}

pub struct PackageProvider {
    manager: PackageManager,
}

impl PackageProvider {
    pub fn new(manager: PackageManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Provider for PackageProvider {
    async fn check(
        &self,
        spec: &ResourceSpec,
        conn: &dyn Connection,
        ctx: &ProviderContext,
    ) -> Result<CurrentState, ProviderError> {
        let ResourceSpec::Package { name, state, .. } = spec else {
            return Ok(CurrentState::absent());
        };
        let installed = sh(conn, ctx, &self.manager.query(name)).await?.success();
        let mut current = if installed {
            CurrentState::present()
        } else {
            CurrentState::absent()
        };
        if installed && *state == PackageState::Latest {
            let outdated = sh(conn, ctx, &self.manager.outdated(name)).await?.success();
            current = current.with("outdated", if outdated { "true" } else { "false" });
        }
        Ok(current)
    }

    fn diff(&self, spec: &ResourceSpec, current: &CurrentState) -> Diff {
        let ResourceSpec::Package { name, state, .. } = spec else {
            return Diff::unchanged("not a package");
        };
        let outdated = current.attrs.get("outdated").map(String::as_str) == Some("true");
        match state {
            PackageState::Present if !current.exists => Diff::changed(
                format!("{name} absent"),
                format!("{name} installed"),
                vec!["install package".to_string()],
            ),
            PackageState::Latest if !current.exists => Diff::changed(
                format!("{name} absent"),
                format!("{name} installed (latest)"),
                vec!["install package".to_string()],
            ),
            PackageState::Latest if outdated => Diff::changed(
                format!("{name} outdated"),
                format!("{name} latest"),
                vec!["upgrade package".to_string()],
            ),
            PackageState::Absent if current.exists => Diff::changed(
                format!("{name} installed"),
                format!("{name} absent"),
                vec!["remove package".to_string()],
            ),
            _ => Diff::unchanged(format!(
                "{name} {}",
                if current.exists { "installed" } else { "absent" }
            )),
        }
    }

    async fn enforce(
        &self,
        spec: &ResourceSpec,
        conn: &dyn Connection,
        ctx: &ProviderContext,
    ) -> Result<(), ProviderError> {
        let ResourceSpec::Package {
            name,
            state,
            version,
            ..
        } = spec
        else {
            return Ok(());
        };
        // Re-derive what to do; enforce only runs when the diff said changed.
        let installed = sh(conn, ctx, &self.manager.query(name)).await?.success();
        let cmd = match state {
            PackageState::Present => self.manager.install(name, version.as_deref()),
            PackageState::Latest if installed => self.manager.upgrade(name),
            PackageState::Latest => self.manager.install(name, version.as_deref()),
            PackageState::Absent => self.manager.remove(name),
        };
        let out = sh(conn, ctx, &cmd).await?;
        if !out.success() {
            return Err(ProviderError::ApplyFailed(out.text()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "package_tests.rs"]
mod tests;
