// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nexus validate`

use crate::output::Ui;
use anyhow::Result;
use nexus_engine::Graph;
use std::path::Path;

pub fn run(config_path: &Path, ui: &Ui) -> Result<i32> {
    // load_config covers parse + reference checks; the DAG build covers
    // cycles and undeclared deps.
    let config = super::load_config(config_path)?;
    Graph::build(config.tasks.values())?;

    if ui.is_json() {
        println!(
            "{}",
            serde_json::json!({
                "valid": true,
                "tasks": config.tasks.len(),
                "hosts": config.hosts.len(),
            })
        );
    } else {
        println!(
            "{}ok{}: {} task(s), {} host(s), {} handler(s)",
            ui.colors.green,
            ui.colors.reset,
            config.tasks.len(),
            config.hosts.len(),
            config.handlers.len()
        );
    }
    Ok(0)
}
