// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nexus init`

use crate::output::Ui;
use anyhow::Result;
use clap::Args;
use nexus_config::Config;
use std::path::Path;

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

pub fn run(config_path: &Path, args: InitArgs, ui: &Ui) -> Result<i32> {
    if config_path.exists() && !args.force {
        eprintln!(
            "{}error:{} {} already exists (use --force to overwrite)",
            ui.colors.red,
            ui.colors.reset,
            config_path.display()
        );
        return Ok(1);
    }
    std::fs::write(config_path, Config::template())?;
    println!(
        "{}wrote{} {}",
        ui.colors.green,
        ui.colors.reset,
        config_path.display()
    );
    Ok(0)
}
