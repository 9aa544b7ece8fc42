// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing setup for the service loop.
//!
//! Initialized only after daemonization (never before: the subscriber may
//! spawn nothing, but callers must not bring up any thread pre-fork), onto
//! stderr — which the daemonizer has already pointed at the append-mode
//! error log. Foreground `run` uses the same setup on the real stderr.

use tracing_subscriber::EnvFilter;

pub fn init(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
