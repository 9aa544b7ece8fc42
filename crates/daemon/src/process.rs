// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal-based termination: deliver SIGTERM (optionally escalating to
//! SIGKILL) and poll until the target is gone.
//!
//! "Gone" is detected by the delivery itself failing with ESRCH, which makes
//! the loop correct for processes we did not spawn and cannot wait on. The
//! recorded pid is trusted unconditionally; there is no check that it still
//! names the service that wrote it.

use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use thiserror::Error;

use crate::clock::Clock;

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;

/// How the stop loop paces and escalates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopPolicy {
    /// Sleep between signal deliveries.
    pub interval: Duration,
    /// After this many SIGTERM deliveries, switch to SIGKILL. `None` keeps
    /// sending SIGTERM until the target exits.
    pub escalate_after: Option<u32>,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            escalate_after: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum TerminateError {
    /// Delivery failed for a reason other than "no such process". The
    /// target's state is unknown; callers must not drop the pidfile.
    #[error("failed to signal pid {pid}: {errno}")]
    Signal { pid: i32, errno: Errno },
}

/// Whether `pid` currently exists (signal-0 probe).
pub fn alive(pid: Pid) -> bool {
    match signal::kill(pid, None) {
        Ok(()) => true,
        // EPERM still proves existence.
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Terminate `pid`: signal, sleep, repeat until delivery fails with ESRCH,
/// which is the success path. Escalates per `policy`; with no escalation
/// configured this blocks for as long as the target keeps ignoring SIGTERM.
pub fn terminate(pid: Pid, policy: &StopPolicy, clock: &dyn Clock) -> Result<(), TerminateError> {
    let mut attempts: u32 = 0;
    loop {
        let sig = match policy.escalate_after {
            Some(threshold) if attempts >= threshold => Signal::SIGKILL,
            _ => Signal::SIGTERM,
        };
        match signal::kill(pid, sig) {
            Ok(()) => {}
            Err(Errno::ESRCH) => return Ok(()),
            Err(errno) => {
                return Err(TerminateError::Signal {
                    pid: pid.as_raw(),
                    errno,
                })
            }
        }
        attempts = attempts.saturating_add(1);
        clock.sleep(policy.interval);
    }
}
