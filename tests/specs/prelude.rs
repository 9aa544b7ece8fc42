// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers for behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

// Spec polling timeouts. Fast polling keeps the suite quick; the generous
// cap absorbs slow CI machines.
pub const SPEC_POLL_INTERVAL_MS: u64 = 10;
pub const SPEC_WAIT_MAX_MS: u64 = 5000;

/// Returns the path to the roost binary.
///
/// Falls back to resolving relative to the test binary itself when
/// CARGO_MANIFEST_DIR points at a stale checkout (e.g. a shared target
/// directory).
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    // The test binary lives at target/debug/deps/specs-<hash>, so its
    // grandparent is target/debug/ where roost is built.
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

pub fn roost_binary() -> PathBuf {
    binary_path("roost")
}

/// One spec's isolated supervisor world: a private state directory, so
/// specs can run concurrently without sharing pidfiles.
pub struct World {
    state: tempfile::TempDir,
}

impl World {
    pub fn new() -> Self {
        Self {
            state: tempfile::TempDir::new().unwrap(),
        }
    }

    pub fn state_dir(&self) -> &Path {
        self.state.path()
    }

    pub fn pidfile(&self) -> PathBuf {
        self.state.path().join("roost.pid")
    }

    pub fn roost(&self, args: &[&str]) -> Outcome {
        let output = Command::new(roost_binary())
            .args(args)
            .env("ROOST_STATE_DIR", self.state.path())
            .env("ROOST_POLL_MS", "10")
            .output()
            .unwrap();
        Outcome {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// The recorded pid, if the pidfile exists and parses.
    pub fn recorded_pid(&self) -> Option<i32> {
        std::fs::read_to_string(self.pidfile())
            .ok()?
            .trim()
            .parse()
            .ok()
    }

    /// Start a daemon and wait for its pidfile to appear.
    pub fn start_daemon(&self, command: &[&str]) -> i32 {
        let mut args = vec!["start", "--"];
        args.extend_from_slice(command);
        self.roost(&args).passes();
        assert!(
            wait_for(SPEC_WAIT_MAX_MS, || self.recorded_pid().is_some()),
            "daemon never wrote its pidfile"
        );
        self.recorded_pid().unwrap()
    }
}

impl Drop for World {
    fn drop(&mut self) {
        // Best-effort teardown so a failed spec does not leak its daemon.
        // Specs may seed the pidfile with the test runner's own pid; never
        // shoot ourselves.
        if let Some(pid) = self.recorded_pid() {
            if pid != std::process::id() as i32 {
                let _ = Command::new("kill").args(["-9", &pid.to_string()]).status();
            }
        }
    }
}

pub struct Outcome {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl Outcome {
    pub fn passes(self) -> Self {
        assert_eq!(
            self.code, 0,
            "expected success\nstdout:\n{}\nstderr:\n{}",
            self.stdout, self.stderr
        );
        self
    }

    pub fn fails(self, expected: i32) -> Self {
        assert_eq!(
            self.code, expected,
            "expected exit code {expected}\nstdout:\n{}\nstderr:\n{}",
            self.stdout, self.stderr
        );
        self
    }

    pub fn stdout_contains(self, needle: &str) -> Self {
        assert!(
            self.stdout.contains(needle),
            "stdout missing {needle:?}:\n{}",
            self.stdout
        );
        self
    }

    pub fn stderr_contains(self, needle: &str) -> Self {
        assert!(
            self.stderr.contains(needle),
            "stderr missing {needle:?}:\n{}",
            self.stderr
        );
        self
    }
}

/// Poll `cond` until it holds or `max_ms` elapses.
pub fn wait_for(max_ms: u64, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(SPEC_POLL_INTERVAL_MS));
    }
}

/// Whether `pid` exists (signal-0 probe via kill(1)).
pub fn process_alive(pid: i32) -> bool {
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Parent pid of `pid`, from /proc.
pub fn parent_pid(pid: i32) -> Option<i32> {
    let status = std::fs::read_to_string(format!("/proc/{pid}/status")).ok()?;
    status
        .lines()
        .find_map(|line| line.strip_prefix("PPid:"))
        .and_then(|v| v.trim().parse().ok())
}
