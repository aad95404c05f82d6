// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nexus list`

use crate::output::Ui;
use anyhow::Result;
use std::path::Path;

pub fn run(config_path: &Path, ui: &Ui) -> Result<i32> {
    let config = super::load_config(config_path)?;

    if ui.is_json() {
        let doc = serde_json::json!({
            "hosts": config.hosts.keys().collect::<Vec<_>>(),
            "groups": config.groups.keys().collect::<Vec<_>>(),
            "tasks": config.tasks.keys().collect::<Vec<_>>(),
            "handlers": config.handlers.keys().collect::<Vec<_>>(),
        });
        println!("{doc}");
        return Ok(0);
    }

    let bold = ui.colors.bold;
    let dim = ui.colors.dim;
    let reset = ui.colors.reset;

    println!("{bold}hosts{reset}");
    for host in config.hosts.values() {
        println!(
            "  {:<20} {dim}{}@{}:{}{reset}",
            host.name,
            host.user.as_deref().unwrap_or("-"),
            host.hostname,
            host.port
        );
    }

    println!("{bold}groups{reset}");
    for group in config.groups.values() {
        println!("  {:<20} {dim}{}{reset}", group.name, group.hosts.join(", "));
    }

    println!("{bold}tasks{reset}");
    for task in config.tasks.values() {
        let deps = if task.deps.is_empty() {
            String::new()
        } else {
            format!("  deps: {}", task.deps.join(", "))
        };
        println!(
            "  {:<20} {dim}on {} ({} step(s)){deps}{reset}",
            task.name,
            task.on,
            task.steps.len()
        );
    }

    if !config.handlers.is_empty() {
        println!("{bold}handlers{reset}");
        for handler in config.handlers.values() {
            println!("  {:<20} {dim}on {}{reset}", handler.name, handler.on);
        }
    }

    Ok(0)
}
