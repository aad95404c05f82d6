// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File resource provider

use super::{sh, CurrentState, Diff, Provider, ProviderContext, ProviderError};
use async_trait::async_trait;
use nexus_adapters::quote::sh_quote_path;
use nexus_adapters::Connection;
use nexus_core::{DesiredState, ResourceSpec};
use std::path::Path;

pub struct FileProvider;

fn desired_content(spec: &ResourceSpec) -> Result<Option<Vec<u8>>, ProviderError> {
    let ResourceSpec::File {
        content, source, ..
    } = spec
    else {
        return Ok(None);
    };
    if let Some(content) = content {
        return Ok(Some(content.clone().into_bytes()));
    }
    if let Some(source) = source {
        return std::fs::read(source)
            .map(Some)
            .map_err(|e| ProviderError::Source(source.display().to_string(), e));
    }
    Ok(None)
}

pub(crate) fn ownership_clause(owner: &Option<String>, group: &Option<String>) -> Option<String> {
    match (owner, group) {
        (Some(o), Some(g)) => Some(format!("{o}:{g}")),
        (Some(o), None) => Some(o.clone()),
        (None, Some(g)) => Some(format!(":{g}")),
        (None, None) => None,
    }
}

#[async_trait]
impl Provider for FileProvider {
    async fn check(
        &self,
        spec: &ResourceSpec,
        conn: &dyn Connection,
        ctx: &ProviderContext,
    ) -> Result<CurrentState, ProviderError> {
        let ResourceSpec::File { path, .. } = spec else {
            return Ok(CurrentState::absent());
        };
        match conn.read_file(path, ctx.sudo).await? {
            Some(content) => Ok(CurrentState::present()
                .with("content", String::from_utf8_lossy(&content).into_owned())),
            None => Ok(CurrentState::absent()),
        }
    }

    fn diff(&self, spec: &ResourceSpec, current: &CurrentState) -> Diff {
        let ResourceSpec::File {
            path,
            state,
            content,
            source,
            ..
        } = spec
        else {
            return Diff::unchanged("not a file");
        };
        let name = path.display().to_string();

        match state {
            DesiredState::Absent => {
                if current.exists {
                    Diff::changed(format!("{name} present"), format!("{name} absent"), vec![
                        "remove file".to_string(),
                    ])
                } else {
                    Diff::unchanged(format!("{name} absent"))
                }
            }
            DesiredState::Present => {
                if !current.exists {
                    return Diff::changed(
                        format!("{name} absent"),
                        format!("{name} present"),
                        vec!["create file".to_string()],
                    );
                }
                // Compare content only when the config pins it.
                let desired = if content.is_some() || source.is_some() {
                    desired_content(spec).ok().flatten()
                } else {
                    None
                };
                if let Some(desired) = desired {
                    let desired = String::from_utf8_lossy(&desired).into_owned();
                    let observed = current.attrs.get("content").cloned().unwrap_or_default();
                    if observed != desired {
                        return Diff::changed(
                            format!("{name} (stale content)"),
                            format!("{name} (declared content)"),
                            vec!["update content".to_string()],
                        );
                    }
                }
                Diff::unchanged(format!("{name} present"))
            }
        }
    }

    async fn enforce(
        &self,
        spec: &ResourceSpec,
        conn: &dyn Connection,
        ctx: &ProviderContext,
    ) -> Result<(), ProviderError> {
        let ResourceSpec::File {
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

        match state {
            DesiredState::Absent => {
                let out = sh(conn, ctx, &format!("rm -f {}", sh_quote_path(path))).await?;
                if !out.success() {
                    return Err(ProviderError::ApplyFailed(out.text()));
                }
            }
            DesiredState::Present => {
                let content = desired_content(spec)?.unwrap_or_default();
                conn.write_file(path, &content, *mode, ctx.sudo).await?;
                if let Some(owners) = ownership_clause(owner, group) {
                    chown(conn, ctx, path, &owners).await?;
                }
            }
        }
        Ok(())
    }
}

pub(crate) async fn chown(
    conn: &dyn Connection,
    ctx: &ProviderContext,
    path: &Path,
    owners: &str,
) -> Result<(), ProviderError> {
    let out = sh(
        conn,
        ctx,
        &format!(
            "chown {} {}",
            nexus_adapters::sh_quote(owners),
            sh_quote_path(path)
        ),
    )
    .await?;
    if !out.success() {
        return Err(ProviderError::ApplyFailed(out.text()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
