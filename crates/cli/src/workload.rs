// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shipped workload: spawn the configured command and wait for it.
//!
//! The child inherits the daemon's (already redirected) standard streams, so
//! its output lands in the service logs.

use std::process::Command;

use roost_daemon::{Workload, WorkloadError};
use tracing::info;

#[cfg(test)]
#[path = "workload_tests.rs"]
mod tests;

/// Runs one command to completion per service-loop iteration.
#[derive(Debug, Clone)]
pub struct CommandWorkload {
    program: String,
    args: Vec<String>,
}

impl CommandWorkload {
    pub fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }
}

impl Workload for CommandWorkload {
    fn run(&mut self) -> Result<(), WorkloadError> {
        info!(program = %self.program, "spawning workload");
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .map_err(|e| {
                WorkloadError::new(format!("failed to spawn {}: {}", self.program, e))
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(WorkloadError::new(format!(
                "{} exited with {}",
                self.program, status
            )))
        }
    }
}
