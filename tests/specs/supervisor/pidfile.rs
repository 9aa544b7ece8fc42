// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pidfile-driven refusal and cleanup specs. None of these launch a daemon:
//! they seed the pidfile directly and observe what the CLI does with it.

use crate::prelude::*;

/// A pid above any plausible pid_max, guaranteed unused on the host.
const UNUSED_PID: &str = "999999999";

#[test]
fn stop_when_not_running_is_a_clean_no_op() {
    let world = World::new();
    world.roost(&["stop"]).passes().stdout_contains("Not running");
    assert!(!world.pidfile().exists());
}

#[test]
fn stop_cleans_up_a_stale_pidfile_and_reports_success() {
    let world = World::new();
    std::fs::write(world.pidfile(), format!("{UNUSED_PID}\n")).unwrap();

    world.roost(&["stop"]).passes().stdout_contains("Stopped");
    assert!(!world.pidfile().exists());
}

#[test]
fn start_refuses_while_a_valid_pid_is_on_record() {
    let world = World::new();
    // Our own pid: guaranteed valid and alive for the duration of the spec.
    let own = std::process::id().to_string();
    std::fs::write(world.pidfile(), format!("{own}\n")).unwrap();

    world
        .roost(&["start", "--", "sleep", "30"])
        .fails(1)
        .stderr_contains("already running");

    // The recorded instance is untouched.
    let content = std::fs::read_to_string(world.pidfile()).unwrap();
    assert_eq!(content, format!("{own}\n"));
}

#[test]
fn start_refuses_on_a_corrupt_pidfile() {
    let world = World::new();
    std::fs::write(world.pidfile(), "definitely-not-a-pid\n").unwrap();

    world
        .roost(&["start", "--", "sleep", "30"])
        .fails(1)
        .stderr_contains("corrupt");

    assert!(world.pidfile().exists());
}

#[test]
fn stop_on_a_corrupt_pidfile_errors_and_preserves_the_file() {
    let world = World::new();
    std::fs::write(world.pidfile(), "definitely-not-a-pid\n").unwrap();

    world.roost(&["stop"]).fails(1).stderr_contains("corrupt");
    assert!(world.pidfile().exists());
}
