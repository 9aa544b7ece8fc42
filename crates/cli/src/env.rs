// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;

// --- Duration helper (private) ---

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

// --- State directory ---

/// Resolve state directory: ROOST_STATE_DIR > XDG_STATE_HOME/roost >
/// ~/.local/state/roost
pub fn state_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("ROOST_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("roost"));
    }
    let home = std::env::var("HOME")
        .map_err(|_| anyhow!("could not determine state directory (HOME is not set)"))?;
    Ok(PathBuf::from(home).join(".local/state/roost"))
}

// --- Config file ---

pub fn config_file() -> Option<PathBuf> {
    std::env::var("ROOST_CONFIG").ok().map(PathBuf::from)
}

// --- Stop polling ---

pub fn poll_interval() -> Option<Duration> {
    parse_duration_ms("ROOST_POLL_MS")
}

// --- Logging ---

/// EnvFilter directive for the daemonized service loop.
pub fn log_filter() -> String {
    std::env::var("ROOST_LOG").unwrap_or_else(|_| "info".to_string())
}
