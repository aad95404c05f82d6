// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! nexus - distributed task runner CLI

mod color;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "nexus",
    version,
    about = "Nexus - declare tasks, bind them to hosts, run them as a pipeline"
)]
struct Cli {
    /// Config file
    #[arg(short = 'c', long = "config", global = true, default_value = "nexus.toml")]
    config: PathBuf,

    /// Verbose output (step durations, debug logging)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Only errors
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value_t, global = true)]
    format: OutputFormat,

    /// Disable colored output (NO_COLOR is also honored)
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute tasks (and their dependencies)
    Run(commands::run::RunArgs),
    /// Print declared tasks, hosts, and groups
    List,
    /// Parse the config and check references, without executing
    Validate,
    /// Config + connectivity + auth checks
    Preflight(commands::preflight::PreflightArgs),
    /// Write a starter config file
    Init(commands::init::InitArgs),
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    let colors = color::Colors::detect(cli.plain);
    let ui = output::Ui {
        format: cli.format,
        colors,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let exit_code = match dispatch(cli, &ui).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}error:{} {e:#}", ui.colors.red, ui.colors.reset);
            1
        }
    };
    std::process::exit(exit_code);
}

async fn dispatch(cli: Cli, ui: &output::Ui) -> Result<i32> {
    match cli.command {
        Commands::Run(args) => commands::run::run(&cli.config, args, ui).await,
        Commands::List => commands::list::run(&cli.config, ui),
        Commands::Validate => commands::validate::run(&cli.config, ui),
        Commands::Preflight(args) => commands::preflight::run(&cli.config, args, ui).await,
        Commands::Init(args) => commands::init::run(&cli.config, args, ui),
    }
}
