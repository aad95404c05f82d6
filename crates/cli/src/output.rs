// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting

use crate::color::Colors;
use clap::ValueEnum;
use nexus_core::{PipelineResult, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Copy)]
pub struct Ui {
    pub format: OutputFormat,
    pub colors: Colors,
    pub verbose: bool,
    pub quiet: bool,
}

impl Ui {
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

fn status_label(status: TaskStatus, colors: &Colors) -> String {
    match status {
        TaskStatus::Ok => format!("{}ok{}", colors.green, colors.reset),
        TaskStatus::Failed => format!("{}failed{}", colors.red, colors.reset),
        TaskStatus::Skipped => format!("{}skipped{}", colors.yellow, colors.reset),
        TaskStatus::SkippedDependency => format!(
            "{}skipped (dependency failed){}",
            colors.yellow, colors.reset
        ),
        TaskStatus::NotRun => format!("{}not run{}", colors.dim, colors.reset),
    }
}

/// Print the end-of-run report: per-task status lines plus a summary, or
/// the stable JSON document.
pub fn print_result(result: &PipelineResult, ui: &Ui) {
    if ui.is_json() {
        println!("{}", result.summary_json());
        return;
    }

    for task in &result.tasks {
        println!("{:<24} {}", task.task, status_label(task.status, &ui.colors));
        if task.status != TaskStatus::Failed && !ui.verbose {
            continue;
        }
        for host in &task.host_results {
            for command in &host.command_results {
                let mut line = format!(
                    "  {}{}{}: {}",
                    ui.colors.dim, host.host, ui.colors.reset, command.description
                );
                if ui.verbose {
                    line.push_str(&format!(" ({} ms)", command.duration_ms));
                }
                println!("{line}");
                if let Some(error) = &command.error {
                    println!("    {}{}{}", ui.colors.red, error, ui.colors.reset);
                } else if command.is_failure() {
                    let trimmed = command.output.trim_end();
                    if !trimmed.is_empty() {
                        for out_line in trimmed.lines().take(20) {
                            println!("    {out_line}");
                        }
                    }
                }
            }
        }
    }

    let verdict = match result.status {
        nexus_core::RunStatus::Ok => format!("{}ok{}", ui.colors.green, ui.colors.reset),
        nexus_core::RunStatus::Error => format!("{}error{}", ui.colors.red, ui.colors.reset),
    };
    println!(
        "\n{}: {} run, {} succeeded, {} failed in {} ms",
        verdict, result.tasks_run, result.tasks_succeeded, result.tasks_failed, result.duration_ms
    );
    if let Some(task) = &result.aborted_at {
        println!("aborted at: {task}");
    }
}
