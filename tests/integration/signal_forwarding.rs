#[path = "common/mod.rs"]
mod common;

use std::{
    fs,
    process::Command,
    thread,
    time::Duration,
};

use common::{initg_bin, send_signal, wait_for_exit, wait_for_path};
use tempfile::tempdir;

#[test]
fn sigterm_is_forwarded_to_a_trapping_child() {
    let temp = tempdir().expect("failed to create tempdir");
    let ready = temp.path().join("ready");

    // The child traps TERM and converts it into exit 42; observing 42 from
    // the supervisor proves the signal crossed the relay.
    let script = format!(
        r#"echo up > {ready}; trap 'exit 42' TERM; while :; do sleep 0.05; done"#,
        ready = ready.display()
    );

    let mut supervisor = Command::new(initg_bin())
        .args(["--", "sh", "-c", &script])
        .spawn()
        .expect("failed to start supervisor");

    wait_for_path(&ready);
    send_signal(supervisor.id(), "TERM");

    let status = wait_for_exit(&mut supervisor, Duration::from_secs(5));
    assert_eq!(status.code(), Some(42));
}

#[test]
fn signals_arrive_exactly_once_and_in_order() {
    let temp = tempdir().expect("failed to create tempdir");
    let ready = temp.path().join("ready");
    let log = temp.path().join("signals.log");

    let script = format!(
        r#"trap 'echo A >> {log}' USR1
trap 'echo B >> {log}' USR2
trap 'exit 0' TERM
echo up > {ready}
while :; do sleep 0.05; done"#,
        log = log.display(),
        ready = ready.display()
    );

    let mut supervisor = Command::new(initg_bin())
        .args(["--", "sh", "-c", &script])
        .spawn()
        .expect("failed to start supervisor");

    wait_for_path(&ready);

    send_signal(supervisor.id(), "USR1");
    thread::sleep(Duration::from_millis(300));
    send_signal(supervisor.id(), "USR2");
    thread::sleep(Duration::from_millis(300));
    send_signal(supervisor.id(), "TERM");

    let status = wait_for_exit(&mut supervisor, Duration::from_secs(5));
    assert_eq!(status.code(), Some(0));

    let observed = fs::read_to_string(&log).expect("child never logged a signal");
    let lines: Vec<&str> = observed.lines().collect();
    assert_eq!(
        lines,
        vec!["A", "B"],
        "child must observe one forwarded signal per signal sent, in arrival order"
    );
}

#[test]
fn signal_sent_during_startup_is_not_lost() {
    let mut supervisor = Command::new(initg_bin())
        .args(["--", "sh", "-c", "trap 'exit 42' TERM; while :; do sleep 0.05; done"])
        .spawn()
        .expect("failed to start supervisor");

    // Fire immediately, without waiting for the child to come up. The mask
    // is installed before the spawn, so the signal must stay pending and be
    // flushed once the relay is live. Depending on whether the child's trap
    // is installed by the time the forward lands, it exits 42 or dies to the
    // default disposition (143); a supervisor that drops the signal instead
    // would spin forever and trip the timeout.
    send_signal(supervisor.id(), "TERM");

    let status = wait_for_exit(&mut supervisor, Duration::from_secs(5));
    let code = status.code();
    assert!(
        code == Some(42) || code == Some(143),
        "signal was dropped entirely: supervisor reported {code:?}"
    );
}
