// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nexus preflight`
//!
//! Config checks, then per-host TCP reachability and SSH auth. Hosts
//! behind `connection = "local"` are trivially reachable and skipped.

use crate::output::Ui;
use anyhow::Result;
use clap::Args;
use nexus_adapters::{ConnectOptions, SshConnection};
use nexus_core::ConnectionKind;
use nexus_engine::Graph;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Args)]
pub struct PreflightArgs {
    /// Tasks to check; with none given, every host is probed
    pub tasks: Vec<String>,

    /// SSH identity file override
    #[arg(short = 'i', long)]
    pub identity: Option<PathBuf>,

    /// SSH user override
    #[arg(short = 'u', long)]
    pub user: Option<String>,
}

pub async fn run(config_path: &Path, args: PreflightArgs, ui: &Ui) -> Result<i32> {
    let config = super::load_config(config_path)?;
    let graph = Graph::build(config.tasks.values())?;

    // Task existence for any explicitly requested names.
    let mut failures = 0usize;
    for task in &args.tasks {
        if !graph.contains(task) {
            println!(
                "{}missing{}: task {task} is not declared",
                ui.colors.red, ui.colors.reset
            );
            failures += 1;
        }
    }

    let opts = ConnectOptions {
        user: args.user,
        identity: args.identity,
        timeout: Some(Duration::from_secs(5)),
        ..ConnectOptions::default()
    };

    for host in config.hosts.values() {
        if host.connection == ConnectionKind::Local {
            println!(
                "{:<20} {}ok{} (local)",
                host.name, ui.colors.green, ui.colors.reset
            );
            continue;
        }

        let addr = format!("{}:{}", host.hostname, host.port);
        let tcp = tokio::time::timeout(
            Duration::from_secs(5),
            tokio::net::TcpStream::connect(&addr),
        )
        .await;
        if !matches!(tcp, Ok(Ok(_))) {
            println!(
                "{:<20} {}unreachable{} ({addr})",
                host.name, ui.colors.red, ui.colors.reset
            );
            failures += 1;
            continue;
        }

        match SshConnection::connect(host, &opts).await {
            Ok(conn) => {
                let alive = conn.is_alive().await;
                conn.close().await;
                if alive {
                    println!(
                        "{:<20} {}ok{} ({addr})",
                        host.name, ui.colors.green, ui.colors.reset
                    );
                } else {
                    println!(
                        "{:<20} {}degraded{} (auth ok, exec failed)",
                        host.name, ui.colors.yellow, ui.colors.reset
                    );
                    failures += 1;
                }
            }
            Err(e) => {
                println!(
                    "{:<20} {}auth failed{} ({e})",
                    host.name, ui.colors.red, ui.colors.reset
                );
                failures += 1;
            }
        }
    }

    if failures == 0 {
        println!("\n{}preflight ok{}", ui.colors.green, ui.colors.reset);
        Ok(0)
    } else {
        println!(
            "\n{}preflight failed{}: {failures} problem(s)",
            ui.colors.red, ui.colors.reset
        );
        Ok(1)
    }
}
