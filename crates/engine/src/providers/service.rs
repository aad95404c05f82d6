// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service resource provider
//!
//! systemd is the default backend; launchd covers darwin and sysvinit
//! covers init systems with a `service` shim (alpine/openrc included).
//! Only systemd supports the `enabled` attribute; the others ignore it.

use super::{sh, CurrentState, Diff, Provider, ProviderContext, ProviderError};
use async_trait::async_trait;
use nexus_adapters::sh_quote;
use nexus_adapters::Connection;
use nexus_core::{ResourceSpec, ServiceState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceManager {
    Systemd,
    Launchd,
    Sysvinit,
}

impl ServiceManager {
    fn is_running(&self, name: &str) -> String {
        let name = sh_quote(name);
        match self {
            ServiceManager::Systemd => format!("systemctl is-active --quiet {name}"),
            ServiceManager::Launchd => format!("launchctl list {name} >/dev/null 2>&1"),
            ServiceManager::Sysvinit => format!("service {name} status >/dev/null 2>&1"),
        }
    }

    fn is_enabled(&self, name: &str) -> Option<String> {
        match self {
            ServiceManager::Systemd => {
                Some(format!("systemctl is-enabled --quiet {}", sh_quote(name)))
            }
            _ => None,
        }
    }

    fn set_running(&self, name: &str, running: bool) -> String {
        let name = sh_quote(name);
        let verb = if running { "start" } else { "stop" };
        match self {
            ServiceManager::Systemd => format!("systemctl {verb} {name}"),
            ServiceManager::Launchd => format!("launchctl {verb} {name}"),
            ServiceManager::Sysvinit => format!("service {name} {verb}"),
        }
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> Option<String> {
        match self {
            ServiceManager::Systemd => {
                let verb = if enabled { "enable" } else { "disable" };
                Some(format!("systemctl {verb} {}", sh_quote(name)))
            }
            _ => None,
        }
    }
}

pub struct ServiceProvider {
    manager: ServiceManager,
}

impl ServiceProvider {
    pub fn new(manager: ServiceManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Provider for ServiceProvider {
    async fn check(
        &self,
        spec: &ResourceSpec,
        conn: &dyn Connection,
        ctx: &ProviderContext,
    ) -> Result<CurrentState, ProviderError> {
        let ResourceSpec::Service { name, enabled, .. } = spec else {
            return Ok(CurrentState::absent());
        };
        let running = sh(conn, ctx, &self.manager.is_running(name)).await?.success();
        let mut current = CurrentState {
            exists: true,
            ..CurrentState::default()
        }
        .with("running", if running { "true" } else { "false" });

        if enabled.is_some() {
            if let Some(cmd) = self.manager.is_enabled(name) {
                let is_enabled = sh(conn, ctx, &cmd).await?.success();
                current = current.with("enabled", if is_enabled { "true" } else { "false" });
            }
        }
        Ok(current)
    }

    fn diff(&self, spec: &ResourceSpec, current: &CurrentState) -> Diff {
        let ResourceSpec::Service {
            name,
            state,
            enabled,
            ..
        } = spec
        else {
            return Diff::unchanged("not a service");
        };

        let running = current.attrs.get("running").map(String::as_str) == Some("true");
        let want_running = *state == ServiceState::Running;
        let mut changes = Vec::new();
        if running != want_running {
            changes.push(if want_running {
                "start service".to_string()
            } else {
                "stop service".to_string()
            });
        }
        if let (Some(want_enabled), Some(is_enabled)) =
            (enabled, current.attrs.get("enabled").map(|v| v == "true"))
        {
            if *want_enabled != is_enabled {
                changes.push(if *want_enabled {
                    "enable service".to_string()
                } else {
                    "disable service".to_string()
                });
            }
        }

        if changes.is_empty() {
            Diff::unchanged(format!(
                "{name} {}",
                if running { "running" } else { "stopped" }
            ))
        } else {
            Diff::changed(
                format!("{name} {}", if running { "running" } else { "stopped" }),
                format!("{name} {}", if want_running { "running" } else { "stopped" }),
                changes,
            )
        }
    }

    async fn enforce(
        &self,
        spec: &ResourceSpec,
        conn: &dyn Connection,
        ctx: &ProviderContext,
    ) -> Result<(), ProviderError> {
        let ResourceSpec::Service {
            name,
            state,
            enabled,
            ..
        } = spec
        else {
            return Ok(());
        };

        let want_running = *state == ServiceState::Running;
        let running = sh(conn, ctx, &self.manager.is_running(name)).await?.success();
        if running != want_running {
            let out = sh(conn, ctx, &self.manager.set_running(name, want_running)).await?;
            if !out.success() {
                return Err(ProviderError::ApplyFailed(out.text()));
            }
        }

        if let Some(want_enabled) = enabled {
            if let Some(cmd) = self.manager.set_enabled(name, *want_enabled) {
                let out = sh(conn, ctx, &cmd).await?;
                if !out.success() {
                    return Err(ProviderError::ApplyFailed(out.text()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
