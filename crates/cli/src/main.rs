// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! roost - single-service process supervisor
//!
//! Turns a foreground command into a detached background service with a
//! pidfile, and controls it with start/stop/restart.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod env;
mod output;
mod telemetry;
mod workload;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use output::OutputFormat;

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

#[derive(Parser)]
#[command(
    name = "roost",
    version,
    about = "roost - turn a command into a supervised background service",
    arg_required_else_help = true
)]
struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    /// Config file (default: <state-dir>/config.toml)
    #[arg(short = 'c', long = "config", global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daemonize and supervise a command
    Start(commands::ServiceArgs),
    /// Stop the running instance and clean up the pidfile
    Stop,
    /// Stop the running instance, then start again
    Restart(commands::ServiceArgs),
    /// Run the service loop in the foreground (no pidfile, no detach)
    #[command(visible_alias = "go")]
    Run(commands::ServiceArgs),
    /// Report whether an instance is running
    Status,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", format_error(&e));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Start(args) => commands::start(args, config),
        Commands::Stop => commands::stop(config),
        Commands::Restart(args) => commands::restart(args, config),
        Commands::Run(args) => commands::run_foreground(args, config),
        Commands::Status => commands::status(config, cli.output),
    }
}

/// Format an anyhow error, skipping the "caused by" chain when the top-level
/// Display already repeats it (common with `#[from]` thiserror variants).
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();
    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));
    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for cause in err.chain().skip(1) {
        buf.push_str(&format!("\n  caused by: {}", cause));
    }
    buf
}
