// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Full daemon lifecycle specs: these actually detach a supervisor process
//! and tear it down again. Each spec runs in its own state directory, so no
//! serialization is needed.

use crate::prelude::*;

#[test]
fn start_then_stop_runs_exactly_one_instance() {
    let world = World::new();

    let pid = world.start_daemon(&["sleep", "30"]);
    assert!(process_alive(pid), "recorded pid should be a live process");

    world.roost(&["stop"]).passes().stdout_contains("Stopped");
    assert!(!world.pidfile().exists(), "stop must remove the pidfile");
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || !process_alive(pid)),
        "stopped daemon should no longer be signalable"
    );
}

#[test]
fn daemon_is_reparented_away_from_the_invoking_process() {
    let world = World::new();

    let pid = world.start_daemon(&["sleep", "30"]);
    // Double-fork property: by the time the pidfile exists, both forebears
    // have exited and a reaper (init or the nearest subreaper) has adopted
    // the daemon. It must not hang off this test process.
    let ppid = parent_pid(pid).unwrap_or(-1);
    assert_ne!(ppid, std::process::id() as i32);
    assert_ne!(ppid, pid);

    world.roost(&["stop"]).passes();
}

#[test]
fn restart_replaces_the_running_instance() {
    let world = World::new();

    let first = world.start_daemon(&["sleep", "30"]);

    world
        .roost(&["restart", "--", "sleep", "30"])
        .passes()
        .stdout_contains("Restarting");

    // The old instance is gone before the new one is launched; the pidfile
    // ends up naming exactly one live process.
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || matches!(
            world.recorded_pid(),
            Some(pid) if pid != first
        )),
        "restart never recorded a fresh pid"
    );
    let second = world.recorded_pid().unwrap();
    assert!(!process_alive(first), "old instance must be gone");
    assert!(process_alive(second), "new instance must be live");

    world.roost(&["stop"]).passes();
}

#[test]
fn restart_when_not_running_just_starts() {
    let world = World::new();

    world.roost(&["restart", "--", "sleep", "30"]).passes();

    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || world.recorded_pid().is_some()),
        "restart from cold never started a daemon"
    );
    world.roost(&["stop"]).passes();
}

#[test]
fn crashed_workload_is_relaunched() {
    let world = World::new();
    let marker = world.state_dir().join("invocations");

    // A workload that records each invocation and exits immediately: only
    // an always-restart loop produces more than one line.
    let script = format!("echo run >> {}; sleep 0.1", marker.display());
    let _pid = world.start_daemon(&["sh", "-c", &script]);

    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || {
            std::fs::read_to_string(&marker)
                .map(|s| s.lines().count() >= 3)
                .unwrap_or(false)
        }),
        "workload was not relaunched after exiting"
    );

    world.roost(&["stop"]).passes();
}
