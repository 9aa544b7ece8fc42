// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor configuration: defaults derived from a state directory, with
//! an optional TOML overlay.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::process::StopPolicy;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Resolved supervisor configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Pidfile recording the live instance.
    pub pidfile: PathBuf,
    /// Stream redirect targets for the detached process.
    pub stdin: PathBuf,
    pub stdout_log: PathBuf,
    pub stderr_log: PathBuf,
    /// Termination pacing.
    pub stop: StopPolicy,
    /// Workload argv. Empty means "not configured".
    pub command: Vec<String>,
}

impl Config {
    /// Defaults rooted in `state_dir`: `roost.pid`, `service.log`,
    /// `service.err`, `/dev/null` input, 100ms poll, no escalation.
    pub fn for_state_dir(state_dir: &Path) -> Self {
        Self {
            pidfile: state_dir.join("roost.pid"),
            stdin: PathBuf::from("/dev/null"),
            stdout_log: state_dir.join("service.log"),
            stderr_log: state_dir.join("service.err"),
            stop: StopPolicy::default(),
            command: Vec::new(),
        }
    }

    /// Overlay the TOML file at `path` onto `self`. A missing file leaves
    /// the defaults untouched; a present-but-invalid file is an error.
    pub fn overlay_file(mut self, path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(self),
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        let file: ConfigFile = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        if let Some(service) = file.service {
            if let Some(command) = service.command {
                self.command = command;
            }
        }
        if let Some(sup) = file.supervisor {
            if let Some(pidfile) = sup.pidfile {
                self.pidfile = pidfile;
            }
            if let Some(stdin) = sup.stdin {
                self.stdin = stdin;
            }
            if let Some(stdout_log) = sup.stdout_log {
                self.stdout_log = stdout_log;
            }
            if let Some(stderr_log) = sup.stderr_log {
                self.stderr_log = stderr_log;
            }
            if let Some(ms) = sup.poll_interval_ms {
                self.stop.interval = Duration::from_millis(ms);
            }
            if let Some(n) = sup.escalate_after {
                self.stop.escalate_after = Some(n);
            }
        }
        Ok(self)
    }
}

/// On-disk shape. Everything optional; absent keys keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    service: Option<ServiceSection>,
    supervisor: Option<SupervisorSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServiceSection {
    command: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SupervisorSection {
    pidfile: Option<PathBuf>,
    stdin: Option<PathBuf>,
    stdout_log: Option<PathBuf>,
    stderr_log: Option<PathBuf>,
    poll_interval_ms: Option<u64>,
    escalate_after: Option<u32>,
}
