#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus},
    thread,
    time::{Duration, Instant},
};

/// Path to the `initg` binary under test.
pub fn initg_bin() -> PathBuf {
    PathBuf::from(assert_cmd::cargo::cargo_bin!("initg"))
}

/// Sends `sig` (a name such as "TERM" or "USR1") to `pid` via the shell.
pub fn send_signal(pid: u32, sig: &str) {
    let status = Command::new("sh")
        .arg("-c")
        .arg(format!("kill -{sig} {pid}"))
        .status()
        .expect("failed to run kill");
    assert!(status.success(), "kill -{sig} {pid} failed");
}

/// Polls until the supervisor process exits, panicking after `timeout`.
pub fn wait_for_exit(child: &mut Child, timeout: Duration) -> ExitStatus {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().expect("failed to poll supervisor") {
            return status;
        }

        if Instant::now() >= deadline {
            let _ = child.kill();
            panic!("Timed out waiting for supervisor to exit");
        }

        thread::sleep(Duration::from_millis(20));
    }
}

pub fn wait_for_path(path: &Path) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if path.exists() {
            return;
        }
        thread::sleep(Duration::from_millis(20));
    }
    panic!("Timed out waiting for {:?} to exist", path);
}

/// Reads a PID that a test script wrote into `path`.
pub fn read_pid_file(path: &Path) -> u32 {
    wait_for_path(path);
    fs::read_to_string(path)
        .expect("failed to read pid file")
        .trim()
        .parse()
        .expect("pid file did not contain a pid")
}

/// Whether `/proc` still has an entry for `pid` (running or zombie).
pub fn proc_exists(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

/// Whether `pid` is a zombie according to `/proc/<pid>/stat`.
pub fn proc_is_zombie(pid: u32) -> bool {
    let Ok(stat) = fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // State is the first field after the parenthesised command name.
    stat.rsplit_once(')')
        .map(|(_, rest)| rest.trim_start().starts_with('Z'))
        .unwrap_or(false)
}

/// Polls until `/proc` no longer has an entry for `pid`.
pub fn wait_for_reap(pid: u32, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !proc_exists(pid) {
            return;
        }
        thread::sleep(Duration::from_millis(20));
    }
    panic!(
        "Timed out waiting for {pid} to be reaped (zombie: {})",
        proc_is_zombie(pid)
    );
}
