// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Double-fork daemonization.
//!
//! The sequence (fork, setsid, fork, chdir, umask, redirect) is the classic
//! Stevens recipe: the first fork severs the caller's job control, setsid
//! drops the controlling terminal, and the second fork ensures the survivor
//! is not a session leader and can never reacquire one.

// fork() has no safe wrapper; the two call sites below are the only unsafe
// code in the workspace.
#![allow(unsafe_code)]

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::process;

use nix::errno::Errno;
use nix::sys::stat::Mode;
use nix::unistd::{self, ForkResult};
use thiserror::Error;

#[cfg(test)]
#[path = "daemonize_tests.rs"]
mod tests;

/// Which fork failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkStage {
    First,
    Second,
}

impl fmt::Display for ForkStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForkStage::First => write!(f, "fork #1"),
            ForkStage::Second => write!(f, "fork #2"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DaemonizeError {
    #[error("{stage} failed: {errno}")]
    Fork { stage: ForkStage, errno: Errno },

    #[error("setsid failed: {errno}")]
    Setsid { errno: Errno },

    #[error("failed to change working directory to {path}: {errno}")]
    Chdir { path: PathBuf, errno: Errno },

    #[error("failed to open {path} for stream redirection: {source}")]
    OpenStream {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to redirect {stream}: {errno}")]
    Redirect { stream: &'static str, errno: Errno },
}

/// Proof that the current process is the detached grandchild. Only
/// [`Daemonize::detach`] constructs one.
#[derive(Debug)]
pub struct Detached {
    _private: (),
}

/// Stream targets and working directory for the detached process.
#[derive(Debug, Clone)]
pub struct Daemonize {
    stdin: PathBuf,
    stdout: PathBuf,
    stderr: PathBuf,
    workdir: PathBuf,
}

impl Daemonize {
    /// `stdin` is opened read-only; `stdout`/`stderr` are opened in
    /// append-mode (created if missing). The working directory defaults to
    /// `/` so the daemon never pins an unmountable ancestor.
    pub fn new(
        stdin: impl Into<PathBuf>,
        stdout: impl Into<PathBuf>,
        stderr: impl Into<PathBuf>,
    ) -> Self {
        Self {
            stdin: stdin.into(),
            stdout: stdout.into(),
            stderr: stderr.into(),
            workdir: PathBuf::from("/"),
        }
    }

    pub fn workdir(mut self, path: impl Into<PathBuf>) -> Self {
        self.workdir = path.into();
        self
    }

    /// Turn the calling process into a detached daemon.
    ///
    /// Returns only in the surviving grandchild. The original caller exits 0
    /// inside the first fork and the intermediate exits 0 inside the second.
    /// A fork failure is returned to whichever process is still running so
    /// it can report the OS error and exit nonzero — in particular a failed
    /// second fork must make the already-detached child exit rather than
    /// carry on as a half-daemonized process.
    ///
    /// Must be called before any threads exist.
    pub fn detach(&self) -> Result<Detached, DaemonizeError> {
        flush_streams();

        // Process is single-threaded here; fork is sound.
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Parent { .. }) => process::exit(0),
            Ok(ForkResult::Child) => {}
            Err(errno) => {
                return Err(DaemonizeError::Fork {
                    stage: ForkStage::First,
                    errno,
                })
            }
        }

        unistd::setsid().map_err(|errno| DaemonizeError::Setsid { errno })?;
        unistd::chdir(self.workdir.as_path()).map_err(|errno| DaemonizeError::Chdir {
            path: self.workdir.clone(),
            errno,
        })?;
        nix::sys::stat::umask(Mode::empty());

        match unsafe { unistd::fork() } {
            Ok(ForkResult::Parent { .. }) => process::exit(0),
            Ok(ForkResult::Child) => {}
            Err(errno) => {
                return Err(DaemonizeError::Fork {
                    stage: ForkStage::Second,
                    errno,
                })
            }
        }

        flush_streams();
        self.redirect_streams()?;

        Ok(Detached { _private: () })
    }

    fn redirect_streams(&self) -> Result<(), DaemonizeError> {
        let stdin = File::open(&self.stdin).map_err(|e| DaemonizeError::OpenStream {
            path: self.stdin.clone(),
            source: e,
        })?;
        let stdout = open_append(&self.stdout)?;
        let stderr = open_append(&self.stderr)?;

        dup_over(&stdin, 0, "stdin")?;
        dup_over(&stdout, 1, "stdout")?;
        dup_over(&stderr, 2, "stderr")
    }
}

fn open_append(path: &Path) -> Result<File, DaemonizeError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| DaemonizeError::OpenStream {
            path: path.to_path_buf(),
            source: e,
        })
}

fn dup_over(file: &File, target_fd: i32, stream: &'static str) -> Result<(), DaemonizeError> {
    unistd::dup2(file.as_raw_fd(), target_fd)
        .map(|_| ())
        .map_err(|errno| DaemonizeError::Redirect { stream, errno })
}

fn flush_streams() {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}
