// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service lifecycle command implementations.

use std::path::Path;

use anyhow::{bail, Result};
use clap::Args;
use roost_daemon::{
    Config, Daemonize, ServiceLoop, ServiceState, StopOutcome, Supervisor,
};

use crate::output::OutputFormat;
use crate::workload::CommandWorkload;
use crate::{env, telemetry};

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;

#[derive(Args)]
pub struct ServiceArgs {
    /// Workload command line; overrides [service].command from the config.
    /// Everything after `--` is passed to the command verbatim.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

pub fn start(args: ServiceArgs, config_path: Option<&Path>) -> Result<()> {
    let cfg = load_config(config_path)?;
    let (program, prog_args) = resolve_command(&args.command, &cfg)?;
    ensure_parent_dirs(&cfg)?;

    println!(
        "Starting service: {}",
        display_command(&program, &prog_args)
    );
    println!("  pidfile: {}", cfg.pidfile.display());
    println!("  stdout:  {}", cfg.stdout_log.display());
    println!("  stderr:  {}", cfg.stderr_log.display());

    launch(&cfg, program, prog_args, LaunchMode::Start)
}

pub fn stop(config_path: Option<&Path>) -> Result<()> {
    let cfg = load_config(config_path)?;
    let supervisor = supervisor_for(&cfg);

    match supervisor.stop()? {
        StopOutcome::Stopped(pid) => println!("Stopped (pid {})", pid),
        StopOutcome::NotRunning => println!("Not running"),
    }
    Ok(())
}

pub fn restart(args: ServiceArgs, config_path: Option<&Path>) -> Result<()> {
    let cfg = load_config(config_path)?;
    let (program, prog_args) = resolve_command(&args.command, &cfg)?;
    ensure_parent_dirs(&cfg)?;

    println!(
        "Restarting service: {}",
        display_command(&program, &prog_args)
    );
    launch(&cfg, program, prog_args, LaunchMode::Restart)
}

pub fn run_foreground(args: ServiceArgs, config_path: Option<&Path>) -> Result<()> {
    let cfg = load_config(config_path)?;
    let (program, prog_args) = resolve_command(&args.command, &cfg)?;

    telemetry::init(&env::log_filter());
    println!(
        "Running in foreground (Ctrl+C to stop): {}",
        display_command(&program, &prog_args)
    );
    ServiceLoop::run(CommandWorkload::new(program, prog_args))
}

pub fn status(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let cfg = load_config(config_path)?;
    let supervisor = supervisor_for(&cfg);
    let pidfile = supervisor.pidfile().path().display().to_string();

    match supervisor.status()? {
        ServiceState::NotRunning => match format {
            OutputFormat::Text => println!("Status: not running"),
            OutputFormat::Json => println!(r#"{{ "status": "not_running" }}"#),
        },
        ServiceState::Running { pid, alive: true } => match format {
            OutputFormat::Text => {
                println!("Status: running");
                println!("Pid: {}", pid);
                println!("Pidfile: {}", pidfile);
            }
            OutputFormat::Json => {
                let obj = serde_json::json!({
                    "status": "running",
                    "pid": pid.as_raw(),
                    "pidfile": pidfile,
                });
                println!("{}", serde_json::to_string_pretty(&obj)?);
            }
        },
        ServiceState::Running { pid, alive: false } => match format {
            OutputFormat::Text => {
                println!(
                    "Status: not running (stale pidfile records pid {})",
                    pid
                );
                println!("Pidfile: {}", pidfile);
            }
            OutputFormat::Json => {
                let obj = serde_json::json!({
                    "status": "stale",
                    "pid": pid.as_raw(),
                    "pidfile": pidfile,
                });
                println!("{}", serde_json::to_string_pretty(&obj)?);
            }
        },
        ServiceState::Ambiguous { content } => match format {
            OutputFormat::Text => {
                println!("Status: unknown (pidfile content {:?})", content);
                println!("Pidfile: {}", pidfile);
            }
            OutputFormat::Json => {
                let obj = serde_json::json!({
                    "status": "ambiguous",
                    "pidfile_content": content,
                    "pidfile": pidfile,
                });
                println!("{}", serde_json::to_string_pretty(&obj)?);
            }
        },
    }
    Ok(())
}

// --- helpers ---

enum LaunchMode {
    Start,
    Restart,
}

fn launch(cfg: &Config, program: String, prog_args: Vec<String>, mode: LaunchMode) -> Result<()> {
    let supervisor = supervisor_for(cfg);
    let daemonize = Daemonize::new(&cfg.stdin, &cfg.stdout_log, &cfg.stderr_log);
    let filter = env::log_filter();
    let workload = CommandWorkload::new(program, prog_args);
    let on_detach = move || telemetry::init(&filter);

    // On success the calling process exits inside the first fork; only
    // failures ever come back.
    let result = match mode {
        LaunchMode::Start => supervisor.start(&daemonize, workload, on_detach),
        LaunchMode::Restart => supervisor.restart(&daemonize, workload, on_detach),
    };
    let err = match result {
        Ok(never) => match never {},
        Err(e) => e,
    };
    Err(err.into())
}

fn supervisor_for(cfg: &Config) -> Supervisor {
    Supervisor::new(
        roost_daemon::Pidfile::new(cfg.pidfile.clone()),
        cfg.stop.clone(),
    )
}

/// Defaults < config file < environment. The command line only contributes
/// the workload argv and the config path.
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let state_dir = env::state_dir()?;
    let file = match config_path {
        Some(path) => path.to_path_buf(),
        None => env::config_file().unwrap_or_else(|| state_dir.join("config.toml")),
    };

    let mut cfg = Config::for_state_dir(&state_dir).overlay_file(&file)?;
    if let Some(interval) = env::poll_interval() {
        cfg.stop.interval = interval;
    }
    Ok(cfg)
}

/// The argv given after `--` wins; otherwise fall back to the config file.
fn resolve_command(cli_argv: &[String], cfg: &Config) -> Result<(String, Vec<String>)> {
    let argv = if cli_argv.is_empty() {
        cfg.command.as_slice()
    } else {
        cli_argv
    };
    match argv.split_first() {
        Some((program, rest)) => Ok((program.clone(), rest.to_vec())),
        None => bail!(
            "no command to supervise: pass one after `--` or set [service].command in the config"
        ),
    }
}

fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The pidfile and log targets may point outside the state directory; make
/// sure every parent exists before the daemon needs them.
fn ensure_parent_dirs(cfg: &Config) -> Result<()> {
    for path in [&cfg.pidfile, &cfg.stdout_log, &cfg.stderr_log] {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
