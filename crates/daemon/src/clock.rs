// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Injectable clock for the termination polling loop.
//!
//! The stop loop sleeps between signal deliveries; routing the sleep through
//! a trait lets tests drive the loop without real-time waits.

use std::sync::Mutex;
use std::time::Duration;

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;

pub trait Clock: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Clock backed by the OS.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Test clock that records requested sleeps instead of waiting.
#[derive(Debug, Default)]
pub struct FakeClock {
    slept: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every sleep requested so far, in order.
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Clock for FakeClock {
    fn sleep(&self, duration: Duration) {
        self.slept
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
    }
}
