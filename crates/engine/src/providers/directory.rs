// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory resource provider

use super::{sh, CurrentState, Diff, Provider, ProviderContext, ProviderError};
use async_trait::async_trait;
use nexus_adapters::quote::sh_quote_path;
use nexus_adapters::Connection;
use nexus_core::{DesiredState, ResourceSpec};

pub struct DirectoryProvider;

#[async_trait]
impl Provider for DirectoryProvider {
    async fn check(
        &self,
        spec: &ResourceSpec,
        conn: &dyn Connection,
        ctx: &ProviderContext,
    ) -> Result<CurrentState, ProviderError> {
        let ResourceSpec::Directory { path, .. } = spec else {
            return Ok(CurrentState::absent());
        };
        let out = sh(conn, ctx, &format!("test -d {}", sh_quote_path(path))).await?;
        Ok(if out.success() {
            CurrentState::present()
        } else {
            CurrentState::absent()
        })
    }

    fn diff(&self, spec: &ResourceSpec, current: &CurrentState) -> Diff {
        let ResourceSpec::Directory { path, state, .. } = spec else {
            return Diff::unchanged("not a directory");
        };
        let name = path.display().to_string();
        match (state, current.exists) {
            (DesiredState::Present, false) => Diff::changed(
                format!("{name} absent"),
                format!("{name} present"),
                vec!["create directory".to_string()],
            ),
            (DesiredState::Absent, true) => Diff::changed(
                format!("{name} present"),
                format!("{name} absent"),
                vec!["remove directory".to_string()],
            ),
            (DesiredState::Present, true) => Diff::unchanged(format!("{name} present")),
            (DesiredState::Absent, false) => Diff::unchanged(format!("{name} absent")),
        }
    }

    async fn enforce(
        &self,
        spec: &ResourceSpec,
        conn: &dyn Connection,
        ctx: &ProviderContext,
    ) -> Result<(), ProviderError> {
        let ResourceSpec::Directory {
            path,
            state,
            owner,
            group,
            mode,
            ..
        } = spec
        else {
            return Ok(());
        };
        let quoted = sh_quote_path(path);

        let cmd = match state {
            DesiredState::Present => {
                let mut cmd = format!("mkdir -p {quoted}");
                if let Some(mode) = mode {
                    cmd.push_str(&format!(" && chmod {mode:o} {quoted}"));
                }
                cmd
            }
            DesiredState::Absent => format!("rm -rf {quoted}"),
        };
        let out = sh(conn, ctx, &cmd).await?;
        if !out.success() {
            return Err(ProviderError::ApplyFailed(out.text()));
        }

        if *state == DesiredState::Present {
            if let Some(owners) = super::file::ownership_clause(owner, group) {
                super::file::chown(conn, ctx, path, &owners).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "directory_tests.rs"]
mod tests;
