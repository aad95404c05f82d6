// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-with-guards resource provider
//!
//! Guard evaluation order: `creates`, `removes`, `unless`, `onlyif`. The
//! first guard that short-circuits wins and the command is reported
//! unchanged.

use super::{sh, CurrentState, Diff, Provider, ProviderContext, ProviderError};
use async_trait::async_trait;
use nexus_adapters::quote::sh_quote_path;
use nexus_adapters::Connection;
use nexus_core::ResourceSpec;

pub struct CommandProvider;

#[async_trait]
impl Provider for CommandProvider {
    async fn check(
        &self,
        spec: &ResourceSpec,
        conn: &dyn Connection,
        ctx: &ProviderContext,
    ) -> Result<CurrentState, ProviderError> {
        let ResourceSpec::Command {
            creates,
            removes,
            unless,
            onlyif,
            ..
        } = spec
        else {
            return Ok(CurrentState::absent());
        };

        let mut needs_run = true;
        let mut reason = "no guard blocked";

        if let Some(creates) = creates {
            let out = sh(conn, ctx, &format!("test -e {}", sh_quote_path(creates))).await?;
            if out.success() {
                needs_run = false;
                reason = "creates path exists";
            }
        }
        if needs_run {
            if let Some(removes) = removes {
                let out = sh(conn, ctx, &format!("test -e {}", sh_quote_path(removes))).await?;
                if !out.success() {
                    needs_run = false;
                    reason = "removes path already absent";
                }
            }
        }
        if needs_run {
            if let Some(unless) = unless {
                if sh(conn, ctx, unless).await?.success() {
                    needs_run = false;
                    reason = "unless condition passed";
                }
            }
        }
        if needs_run {
            if let Some(onlyif) = onlyif {
                if !sh(conn, ctx, onlyif).await?.success() {
                    needs_run = false;
                    reason = "onlyif condition failed";
                }
            }
        }

        Ok(CurrentState::present()
            .with("needs_run", if needs_run { "true" } else { "false" })
            .with("reason", reason))
    }

    fn diff(&self, spec: &ResourceSpec, current: &CurrentState) -> Diff {
        let ResourceSpec::Command { command, .. } = spec else {
            return Diff::unchanged("not a command");
        };
        let needs_run = current.attrs.get("needs_run").map(String::as_str) == Some("true");
        if needs_run {
            Diff::changed(
                "not yet run".to_string(),
                format!("ran: {command}"),
                vec!["run command".to_string()],
            )
        } else {
            let reason = current
                .attrs
                .get("reason")
                .cloned()
                .unwrap_or_else(|| "guard blocked".to_string());
            Diff::unchanged(reason)
        }
    }

    async fn enforce(
        &self,
        spec: &ResourceSpec,
        conn: &dyn Connection,
        ctx: &ProviderContext,
    ) -> Result<(), ProviderError> {
        let ResourceSpec::Command { command, .. } = spec else {
            return Ok(());
        };
        let out = sh(conn, ctx, command).await?;
        if !out.success() {
            return Err(ProviderError::ApplyFailed(format!(
                "exit {}: {}",
                out.exit_code,
                out.text()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
