// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Group resource provider

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

pub struct GroupProvider {
    backend: Backend,
}

impl GroupProvider {
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

#[async_trait]
impl Provider for GroupProvider {
    async fn check(
        &self,
        spec: &ResourceSpec,
        conn: &dyn Connection,
        ctx: &ProviderContext,
    ) -> Result<CurrentState, ProviderError> {
        let ResourceSpec::Group { name, .. } = spec else {
            return Ok(CurrentState::absent());
        };
        let quoted = sh_quote(name);
        match self.backend {
            Backend::Darwin => {
                let out = sh(conn, ctx, &format!("dscl . -read /Groups/{quoted} PrimaryGroupID"))
                    .await?;
                Ok(if out.success() {
                    CurrentState::present()
                } else {
                    CurrentState::absent()
                })
            }
            Backend::Linux => {
                let out = sh(conn, ctx, &format!("getent group {quoted}")).await?;
                if !out.success() {
                    return Ok(CurrentState::absent());
                }
                // name:x:gid:members
                let line = out.text();
                let mut current = CurrentState::present();
                if let Some(gid) = line.trim().split(':').nth(2) {
                    current = current.with("gid", gid);
                }
                Ok(current)
            }
        }
    }

    fn diff(&self, spec: &ResourceSpec, current: &CurrentState) -> Diff {
        let ResourceSpec::Group {
            name, state, gid, ..
        } = spec
        else {
            return Diff::unchanged("not a group");
        };

        match state {
            DesiredState::Absent => {
                if current.exists {
                    Diff::changed(
                        format!("group {name} present"),
                        format!("group {name} absent"),
                        vec!["remove group".to_string()],
                    )
                } else {
                    Diff::unchanged(format!("group {name} absent"))
                }
            }
            DesiredState::Present => {
                if !current.exists {
                    return Diff::changed(
                        format!("group {name} absent"),
                        format!("group {name} present"),
                        vec!["create group".to_string()],
                    );
                }
                if self.backend == Backend::Linux {
                    if let Some(gid) = gid {
                        if current.attrs.get("gid").map(String::as_str)
                            != Some(gid.to_string().as_str())
                        {
                            return Diff::changed(
                                format!("group {name} (stale gid)"),
                                format!("group {name} gid={gid}"),
                                vec![format!("set gid {gid}")],
                            );
                        }
                    }
                }
                Diff::unchanged(format!("group {name} present"))
            }
        }
    }

    async fn enforce(
        &self,
        spec: &ResourceSpec,
        conn: &dyn Connection,
        ctx: &ProviderContext,
    ) -> Result<(), ProviderError> {
        let ResourceSpec::Group {
            name,
            state,
            gid,
            system,
            ..
        } = spec
        else {
            return Ok(());
        };
        let quoted = sh_quote(name);

        let exists = match self.backend {
            Backend::Linux => sh(conn, ctx, &format!("getent group {quoted}")).await?.success(),
            Backend::Darwin => {
                sh(conn, ctx, &format!("dscl . -read /Groups/{quoted} PrimaryGroupID"))
                    .await?
                    .success()
            }
        };

        let cmd = match (self.backend, state, exists) {
            (Backend::Darwin, DesiredState::Present, false) => {
                format!("dscl . -create /Groups/{quoted}")
            }
            (Backend::Darwin, DesiredState::Absent, true) => {
                format!("dscl . -delete /Groups/{quoted}")
            }
            (Backend::Darwin, _, _) => return Ok(()),
            (Backend::Linux, DesiredState::Absent, true) => format!("groupdel {quoted}"),
            (Backend::Linux, DesiredState::Absent, false) => return Ok(()),
            (Backend::Linux, DesiredState::Present, true) => match gid {
                Some(gid) => format!("groupmod -g {gid} {quoted}"),
                None => return Ok(()),
            },
            (Backend::Linux, DesiredState::Present, false) => {
                let mut cmd = "groupadd".to_string();
                if *system {
                    cmd.push_str(" -r");
                }
                if let Some(gid) = gid {
                    cmd.push_str(&format!(" -g {gid}"));
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
#[path = "group_tests.rs"]
mod tests;
