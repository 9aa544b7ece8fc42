// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle controller: start/stop/restart policy over the pidfile and the
//! termination primitive.
//!
//! State is never stored in memory; every operation re-derives it from the
//! pidfile so independent invocations (start from one shell, stop from
//! another) agree on what is running.

use std::convert::Infallible;

use nix::unistd::Pid;
use thiserror::Error;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::daemonize::{Daemonize, DaemonizeError};
use crate::pidfile::{PidRecord, Pidfile, PidfileError};
use crate::process::{self, StopPolicy, TerminateError};
use crate::service::{ServiceLoop, Workload};

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("already running (pidfile {pidfile} records pid {pid})")]
    AlreadyRunning { pid: Pid, pidfile: String },

    #[error("pidfile {pidfile} is corrupt (content {content:?}); refusing to act on it")]
    CorruptPidfile { pidfile: String, content: String },

    #[error("termination failed: {0}")]
    Termination(#[from] TerminateError),

    #[error(transparent)]
    Pidfile(#[from] PidfileError),

    #[error(transparent)]
    Daemonize(#[from] DaemonizeError),
}

/// Logical service state, derived from the pidfile on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceState {
    NotRunning,
    /// The pidfile records `pid`. `alive` is a point-in-time signal-0 probe;
    /// false means the record is stale.
    Running { pid: Pid, alive: bool },
    /// Pidfile present but unusable.
    Ambiguous { content: String },
}

/// Outcome of a successful `stop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// Nothing on record; explicitly success so restart stays idempotent.
    NotRunning,
    /// Signalled until gone (or found already gone), pidfile removed.
    Stopped(Pid),
}

/// Owns the pidfile and drives the daemonizer and terminator.
pub struct Supervisor<C: Clock = SystemClock> {
    pidfile: Pidfile,
    stop_policy: StopPolicy,
    clock: C,
}

impl Supervisor<SystemClock> {
    pub fn new(pidfile: Pidfile, stop_policy: StopPolicy) -> Self {
        Self::with_clock(pidfile, stop_policy, SystemClock)
    }
}

impl<C: Clock> Supervisor<C> {
    pub fn with_clock(pidfile: Pidfile, stop_policy: StopPolicy, clock: C) -> Self {
        Self {
            pidfile,
            stop_policy,
            clock,
        }
    }

    pub fn pidfile(&self) -> &Pidfile {
        &self.pidfile
    }

    /// Derive the current state from the pidfile.
    pub fn status(&self) -> Result<ServiceState, LifecycleError> {
        Ok(match self.pidfile.read()? {
            PidRecord::Absent => ServiceState::NotRunning,
            PidRecord::Valid(pid) => ServiceState::Running {
                pid,
                alive: process::alive(pid),
            },
            PidRecord::Corrupt(content) => ServiceState::Ambiguous { content },
        })
    }

    /// Start the service: refuse if an instance is on record, otherwise
    /// detach and run `workload` forever.
    ///
    /// On success this never returns — the invoking process exits inside the
    /// first fork and the surviving grandchild loops until killed.
    /// `on_detach` runs in the grandchild before the pidfile is written;
    /// it is where the caller brings up logging on the redirected streams.
    pub fn start(
        &self,
        daemonize: &Daemonize,
        workload: impl Workload,
        on_detach: impl FnOnce(),
    ) -> Result<Infallible, LifecycleError> {
        match self.pidfile.read()? {
            PidRecord::Absent => {}
            PidRecord::Valid(pid) => {
                return Err(LifecycleError::AlreadyRunning {
                    pid,
                    pidfile: self.pidfile.path().display().to_string(),
                })
            }
            PidRecord::Corrupt(content) => {
                return Err(LifecycleError::CorruptPidfile {
                    pidfile: self.pidfile.path().display().to_string(),
                    content,
                })
            }
        }

        let _detached = daemonize.detach()?;
        // Only the detached grandchild reaches this point.
        on_detach();

        // Cleanup is registered before the pidfile exists so a write failure
        // cannot leave an unremovable record behind. The guard only fires on
        // an orderly exit from this frame (an unwind); a SIGTERM from stop()
        // leaves the file for stop() itself to remove.
        let _guard = PidfileGuard {
            pidfile: &self.pidfile,
        };
        let pid = nix::unistd::getpid();
        self.pidfile.write(pid)?;
        info!(%pid, pidfile = %self.pidfile.path().display(), "service detached");

        ServiceLoop::run(workload)
    }

    /// Stop the recorded instance: signal and poll until the pid is gone,
    /// then drop the pidfile.
    ///
    /// The recorded pid is trusted unconditionally. A stale record (process
    /// already gone) is the ordinary success path: the first delivery fails
    /// with "no such process" and the file is cleaned up. Any other delivery
    /// failure preserves the pidfile — the state is ambiguous and the lock
    /// must not be silently dropped.
    pub fn stop(&self) -> Result<StopOutcome, LifecycleError> {
        let pid = match self.pidfile.read()? {
            PidRecord::Absent => return Ok(StopOutcome::NotRunning),
            PidRecord::Valid(pid) => pid,
            PidRecord::Corrupt(content) => {
                return Err(LifecycleError::CorruptPidfile {
                    pidfile: self.pidfile.path().display().to_string(),
                    content,
                })
            }
        };

        process::terminate(pid, &self.stop_policy, &self.clock)?;
        self.pidfile.remove()?;
        Ok(StopOutcome::Stopped(pid))
    }

    /// Stop (idempotent), then start unconditionally with no delay between
    /// the two phases. Callers that need the stopped instance's resources
    /// (ports, sockets) released must tolerate transient rebind failures.
    pub fn restart(
        &self,
        daemonize: &Daemonize,
        workload: impl Workload,
        on_detach: impl FnOnce(),
    ) -> Result<Infallible, LifecycleError> {
        self.stop()?;
        self.start(daemonize, workload, on_detach)
    }
}

struct PidfileGuard<'a> {
    pidfile: &'a Pidfile,
}

impl Drop for PidfileGuard<'_> {
    fn drop(&mut self) {
        let _ = self.pidfile.remove();
    }
}
