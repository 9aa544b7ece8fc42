// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pidfile primitive: one ASCII process id, newline-terminated.
//!
//! The pidfile is the only durable record of "an instance is running".
//! Existence means presence; content names the pid. There is no lock beyond
//! that, so two racing starts can both observe absence — callers serialize
//! start/stop/restart operationally.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use nix::unistd::Pid;
use thiserror::Error;

#[cfg(test)]
#[path = "pidfile_tests.rs"]
mod tests;

/// What a read of the pidfile found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PidRecord {
    /// No file: no instance on record.
    Absent,
    /// A usable pid.
    Valid(Pid),
    /// File present but content is not a positive integer. Presence still
    /// counts as "an instance may be running"; the trimmed content is kept
    /// for diagnostics.
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum PidfileError {
    #[error("failed to read pidfile {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write pidfile {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove pidfile {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Handle on the pidfile path.
#[derive(Debug, Clone)]
pub struct Pidfile {
    path: PathBuf,
}

impl Pidfile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the recorded pid. A missing file is `Absent`, unparsable content
    /// is `Corrupt`; only real I/O failures are errors.
    pub fn read(&self) -> Result<PidRecord, PidfileError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(PidRecord::Absent),
            Err(e) => {
                return Err(PidfileError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        match content.trim().parse::<i32>() {
            Ok(pid) if pid > 0 => Ok(PidRecord::Valid(Pid::from_raw(pid))),
            _ => Ok(PidRecord::Corrupt(content.trim().to_string())),
        }
    }

    /// Record `pid`, replacing any prior content. Writes a sibling temp file
    /// and renames it over the target so readers never observe a partial
    /// record.
    pub fn write(&self, pid: Pid) -> Result<(), PidfileError> {
        let tmp = self.tmp_path();
        fs::write(&tmp, format!("{}\n", pid)).map_err(|e| PidfileError::Write {
            path: self.path.clone(),
            source: e,
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| PidfileError::Write {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Delete the pidfile. Already absent is success.
    pub fn remove(&self) -> Result<(), PidfileError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PidfileError::Remove {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut os: OsString = self.path.as_os_str().to_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    }
}
