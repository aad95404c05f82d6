// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User resource provider
//!
//! Linux uses the shadow-utils tool chain (getent/useradd/usermod/userdel)
//! and diffs uid, shell, home, and supplementary groups. Darwin's dscl
//! backend manages existence only; attribute convergence on macOS is out of
//! reach of a portable shell session.

use super::{sh, CurrentState, Diff, Provider, ProviderContext, ProviderError};
use async_trait::async_trait;
use nexus_adapters::sh_quote;
use nexus_adapters::Connection;
use nexus_core::{DesiredState, ResourceSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Linux,
    Darwin,
}

pub struct UserProvider {
    backend: Backend,
}

impl UserProvider {
    pub fn linux() -> Self {
        Self {
            backend: Backend::Linux,
        }
    }

    pub fn darwin() -> Self {
        Self {
            backend: Backend::Darwin,
        }
    }
}

fn normalized_groups(groups: &[String]) -> String {
    let mut sorted: Vec<&str> = groups.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.join(",")
}

#[async_trait]
impl Provider for UserProvider {
    async fn check(
        &self,
        spec: &ResourceSpec,
        conn: &dyn Connection,
        ctx: &ProviderContext,
    ) -> Result<CurrentState, ProviderError> {
        let ResourceSpec::User { name, groups, .. } = spec else {
            return Ok(CurrentState::absent());
        };
        let quoted = sh_quote(name);

        match self.backend {
            Backend::Darwin => {
                let out = sh(conn, ctx, &format!("dscl . -read /Users/{quoted} UniqueID")).await?;
                Ok(if out.success() {
                    CurrentState::present()
                } else {
                    CurrentState::absent()
                })
            }
            Backend::Linux => {
                let out = sh(conn, ctx, &format!("getent passwd {quoted}")).await?;
                if !out.success() {
                    return Ok(CurrentState::absent());
                }
                // name:x:uid:gid:gecos:home:shell
                let line = out.text();
                let fields: Vec<&str> = line.trim().split(':').collect();
                let mut current = CurrentState::present();
                if let Some(uid) = fields.get(2) {
                    current = current.with("uid", *uid);
                }
                if let Some(home) = fields.get(5) {
                    current = current.with("home", *home);
                }
                if let Some(shell) = fields.get(6) {
                    current = current.with("shell", *shell);
                }
                if !groups.is_empty() {
                    let out = sh(conn, ctx, &format!("id -Gn {quoted}")).await?;
                    if out.success() {
                        let observed: Vec<String> = out
                            .text()
                            .split_whitespace()
                            .map(str::to_string)
                            .collect();
                        current = current.with("groups", normalized_groups(&observed));
                    }
                }
                Ok(current)
            }
        }
    }

    fn diff(&self, spec: &ResourceSpec, current: &CurrentState) -> Diff {
        let ResourceSpec::User {
            name,
            state,
            uid,
            shell,
            home,
            groups,
            ..
        } = spec
        else {
            return Diff::unchanged("not a user");
        };

        match state {
            DesiredState::Absent => {
                if current.exists {
                    Diff::changed(
                        format!("user {name} present"),
                        format!("user {name} absent"),
                        vec!["remove user".to_string()],
                    )
                } else {
                    Diff::unchanged(format!("user {name} absent"))
                }
            }
            DesiredState::Present => {
                if !current.exists {
                    return Diff::changed(
                        format!("user {name} absent"),
                        format!("user {name} present"),
                        vec!["create user".to_string()],
                    );
                }
                let mut changes = Vec::new();
                if self.backend == Backend::Linux {
                    if let Some(uid) = uid {
                        if current.attrs.get("uid").map(String::as_str)
                            != Some(uid.to_string().as_str())
                        {
                            changes.push(format!("set uid {uid}"));
                        }
                    }
                    if let Some(shell) = shell {
                        if current.attrs.get("shell") != Some(shell) {
                            changes.push(format!("set shell {shell}"));
                        }
                    }
                    if let Some(home) = home {
                        let home = home.display().to_string();
                        if current.attrs.get("home") != Some(&home) {
                            changes.push(format!("set home {home}"));
                        }
                    }
                    if !groups.is_empty() {
                        let want = normalized_groups(groups);
                        // Supplementary groups must contain the declared set.
                        let observed = current.attrs.get("groups").cloned().unwrap_or_default();
                        let observed: Vec<&str> = observed.split(',').collect();
                        if want.split(',').any(|g| !observed.contains(&g)) {
                            changes.push(format!("set groups {want}"));
                        }
                    }
                }
                if changes.is_empty() {
                    Diff::unchanged(format!("user {name} present"))
                } else {
                    Diff::changed(
                        format!("user {name} (stale attrs)"),
                        format!("user {name} (declared attrs)"),
                        changes,
                    )
                }
            }
        }
    }

    async fn enforce(
        &self,
        spec: &ResourceSpec,
        conn: &dyn Connection,
        ctx: &ProviderContext,
    ) -> Result<(), ProviderError> {
        let ResourceSpec::User {
            name,
            state,
            uid,
            group,
            groups,
            shell,
            home,
            system,
            ..
        } = spec
        else {
            return Ok(());
        };
        let quoted = sh_quote(name);

        let exists = match self.backend {
            Backend::Linux => sh(conn, ctx, &format!("getent passwd {quoted}")).await?.success(),
            Backend::Darwin => {
                sh(conn, ctx, &format!("dscl . -read /Users/{quoted} UniqueID"))
                    .await?
                    .success()
            }
        };

        let cmd = match (self.backend, state, exists) {
            (Backend::Darwin, DesiredState::Present, false) => {
                format!("dscl . -create /Users/{quoted}")
            }
            (Backend::Darwin, DesiredState::Absent, true) => {
                format!("dscl . -delete /Users/{quoted}")
            }
            (Backend::Darwin, _, _) => return Ok(()),
            (Backend::Linux, DesiredState::Absent, true) => format!("userdel {quoted}"),
            (Backend::Linux, DesiredState::Absent, false) => return Ok(()),
            (Backend::Linux, DesiredState::Present, exists) => {
                let tool = if exists { "usermod" } else { "useradd" };
                let mut cmd = tool.to_string();
                if let Some(uid) = uid {
                    cmd.push_str(&format!(" -u {uid}"));
                }
                if let Some(group) = group {
                    cmd.push_str(&format!(" -g {}", sh_quote(group)));
                }
                if !groups.is_empty() {
                    cmd.push_str(&format!(" -G {}", sh_quote(&groups.join(","))));
                }
                if let Some(shell) = shell {
                    cmd.push_str(&format!(" -s {}", sh_quote(shell)));
                }
                if let Some(home) = home {
                    cmd.push_str(&format!(" -d {}", sh_quote(&home.display().to_string())));
                }
                if !exists {
                    if *system {
                        cmd.push_str(" -r");
                    }
                    cmd.push_str(" -m");
                }
                cmd.push(' ');
                cmd.push_str(&quoted);
                cmd
            }
        };

        let out = sh(conn, ctx, &cmd).await?;
        if !out.success() {
            return Err(ProviderError::ApplyFailed(out.text()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "user_tests.rs"]
mod tests;
