// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod init;
pub mod list;
pub mod preflight;
pub mod run;
pub mod validate;

use anyhow::{Context, Result};
use nexus_config::Config;
use std::path::Path;

/// Load and reference-check the config, with errors shaped for the CLI.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path).with_context(|| format!("loading {}", path.display()))?;
    if let Err(errors) = nexus_config::validate(&config) {
        let rendered: Vec<String> = errors.iter().map(|e| format!("  - {e}")).collect();
        anyhow::bail!("invalid config:\n{}", rendered.join("\n"));
    }
    Ok(config)
}
