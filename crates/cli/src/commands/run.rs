// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nexus run`

use crate::output::{print_result, Ui};
use anyhow::Result;
use clap::Args;
use nexus_adapters::{CancelToken, ChunkFn, ConnectOptions, OutputChunk};
use nexus_core::{Event, RunStatus};
use nexus_engine::{RunOptions, Runner};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args)]
pub struct RunArgs {
    /// Tasks to run (with their transitive dependencies)
    #[arg(required = true)]
    pub tasks: Vec<String>,

    /// Plan only; print phases and exit
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,

    /// Check mode: providers diff but never apply; commands are skipped
    #[arg(long)]
    pub check: bool,

    /// SSH identity file override for all hosts
    #[arg(short = 'i', long)]
    pub identity: Option<PathBuf>,

    /// SSH user override for all hosts
    #[arg(short = 'u', long)]
    pub user: Option<String>,

    /// Max tasks in flight at once
    #[arg(short = 'p', long = "parallel-limit", default_value_t = 10)]
    pub parallel_limit: usize,

    /// Keep going past task failures (dependents are still skipped)
    #[arg(long)]
    pub continue_on_error: bool,

    /// Only run tasks carrying one of these tags
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Drop tasks carrying one of these tags
    #[arg(long, value_delimiter = ',')]
    pub skip_tags: Vec<String>,
}

/// Live progress sink: one line per task/host transition.
fn attach_progress(runner: &Runner, ui: Ui) {
    runner.bus().attach(
        "cli-progress",
        &["task:*", "pipeline:start"],
        Arc::new(move |event: &Event| {
            if ui.quiet || ui.is_json() {
                return;
            }
            match event {
                Event::PipelineStart { tasks, .. } => {
                    eprintln!(
                        "{}starting {} task(s){}",
                        ui.colors.dim,
                        tasks.len(),
                        ui.colors.reset
                    );
                }
                Event::TaskStart { task, host, .. } => {
                    eprintln!("{}> {task} @ {host}{}", ui.colors.dim, ui.colors.reset);
                }
                Event::TaskStop {
                    task,
                    host,
                    duration_ms,
                    error,
                    ..
                } => match error {
                    Some(error) => eprintln!(
                        "{}< {task} @ {host}: {error}{}",
                        ui.colors.red, ui.colors.reset
                    ),
                    None if ui.verbose => eprintln!(
                        "{}< {task} @ {host} ({duration_ms} ms){}",
                        ui.colors.dim, ui.colors.reset
                    ),
                    None => {}
                },
                _ => {}
            }
        }),
    );
}

pub async fn run(config_path: &Path, args: RunArgs, ui: &Ui) -> Result<i32> {
    let config = super::load_config(config_path)?;
    let runner = Runner::new();

    if args.dry_run {
        let plan = runner.dry_run(&config, &args.tasks)?;
        if ui.is_json() {
            println!(
                "{}",
                serde_json::json!({
                    "total_tasks": plan.total_tasks,
                    "phases": plan.phases,
                })
            );
        } else {
            println!("{} task(s) in {} phase(s)", plan.total_tasks, plan.phases.len());
            for (index, phase) in plan.phases.iter().enumerate() {
                println!("  phase {}: {}", index + 1, phase.join(", "));
            }
        }
        return Ok(0);
    }

    attach_progress(&runner, *ui);

    // Operator interrupt: ^C fires the cancel token.
    let cancel = CancelToken::new();
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; cancelling pipeline");
                cancel.cancel();
            }
        });
    }

    let output: Option<ChunkFn> = if ui.verbose && !ui.is_json() {
        Some(Arc::new(|chunk: OutputChunk| {
            let mut stderr = std::io::stderr().lock();
            let _ = stderr.write_all(&chunk.data);
        }))
    } else {
        None
    };

    let opts = RunOptions {
        check_mode: args.check,
        tags: args.tags,
        skip_tags: args.skip_tags,
        parallel_limit: args.parallel_limit,
        continue_on_error: args.continue_on_error,
        ssh: ConnectOptions {
            user: args.user,
            identity: args.identity,
            ..ConnectOptions::default()
        },
        output,
        cancel: Some(cancel),
        ..RunOptions::default()
    };

    let result = runner.run(&config, &args.tasks, opts).await?;
    print_result(&result, ui);
    Ok(if result.status == RunStatus::Ok { 0 } else { 1 })
}
