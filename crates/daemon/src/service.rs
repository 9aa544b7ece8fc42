// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The always-restart service loop.
//!
//! One workload invocation runs to completion before the next begins. There
//! is no backoff, no iteration limit, and no error containment beyond the
//! loop itself: a workload failure is logged and the next iteration starts
//! immediately. Crash-and-restart, not fail-fast.

use std::io;

use thiserror::Error;
use tracing::{error, info};

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;

/// A workload failure. Never fatal to the daemon: the loop logs it and
/// begins the next iteration.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct WorkloadError(String);

impl WorkloadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<io::Error> for WorkloadError {
    fn from(e: io::Error) -> Self {
        Self(e.to_string())
    }
}

/// One supervised unit of work. Runs until it returns (or the process is
/// killed); the supervisor invokes it again as soon as it does.
pub trait Workload {
    fn run(&mut self) -> Result<(), WorkloadError>;
}

impl<F> Workload for F
where
    F: FnMut() -> Result<(), WorkloadError>,
{
    fn run(&mut self) -> Result<(), WorkloadError> {
        self()
    }
}

/// Unbounded invoke-and-restart cycle.
pub struct ServiceLoop;

impl ServiceLoop {
    /// Run `workload` forever.
    pub fn run(mut workload: impl Workload) -> ! {
        let mut iteration: u64 = 0;
        loop {
            iteration = iteration.wrapping_add(1);
            Self::turn(&mut workload, iteration);
        }
    }

    /// One iteration: invoke the workload and contain its outcome.
    fn turn(workload: &mut impl Workload, iteration: u64) {
        info!(iteration, "workload starting");
        match workload.run() {
            Ok(()) => info!(iteration, "workload returned, relaunching"),
            Err(e) => error!(iteration, error = %e, "workload failed, relaunching"),
        }
    }
}
