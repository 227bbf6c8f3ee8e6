//! Designated child process creation.

use std::{
    os::unix::process::CommandExt,
    process::Command,
};

use nix::unistd::Pid;
use tracing::{debug, error};

use crate::error::InitError;

/// Lifecycle state of the designated child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildState {
    /// The process has been created but the event loop has not started yet.
    Spawned,
    /// The event loop is relaying signals to the process.
    Running,
    /// The process has been reaped and its outcome recorded.
    Terminated,
}

/// The single process the supervisor was invoked to manage.
///
/// Created once at startup, never re-created; exactly one instance exists per
/// supervisor invocation. Only the reaper transitions it to `Terminated`.
#[derive(Debug)]
pub struct DesignatedChild {
    pid: Pid,
    command: String,
    state: ChildState,
}

impl DesignatedChild {
    /// Process identifier of the child.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// The command line the child was started with, for diagnostics.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ChildState {
        self.state
    }

    /// Whether the child has already been reaped.
    pub fn is_terminated(&self) -> bool {
        self.state == ChildState::Terminated
    }

    /// Marks the child as running once the event loop takes over.
    pub(crate) fn mark_running(&mut self) {
        if self.state == ChildState::Spawned {
            self.state = ChildState::Running;
        }
    }

    /// Records that the child has been reaped. Called exactly once, by the
    /// reaper.
    pub(crate) fn mark_terminated(&mut self) {
        self.state = ChildState::Terminated;
    }
}

/// Launches the designated child with inherited standard streams and
/// environment, and returns its handle.
///
/// With `own_process_group` set (subreaper mode), the child is placed in its
/// own process group so forwarded signals can target the whole subtree
/// without touching the supervisor's group.
///
/// Exactly one process is created; a spawn failure is fatal and no retry is
/// attempted.
pub fn spawn_designated(
    command: &str,
    args: &[String],
    own_process_group: bool,
) -> Result<DesignatedChild, InitError> {
    debug!("Launching designated child: `{command}` with args {args:?}");

    let mut cmd = Command::new(command);
    cmd.args(args);

    if own_process_group {
        unsafe {
            cmd.pre_exec(|| {
                if libc::setpgid(0, 0) < 0 {
                    let err = std::io::Error::last_os_error();
                    eprintln!("initg pre_exec: setpgid(0, 0) failed: {:?}", err);
                    return Err(err);
                }
                Ok(())
            });
        }
    }

    match cmd.spawn() {
        Ok(child) => {
            let pid = Pid::from_raw(child.id() as i32);
            debug!("Designated child started with PID: {pid}");
            Ok(DesignatedChild {
                pid,
                command: command.to_string(),
                state: ChildState::Spawned,
            })
        }
        Err(e) => {
            error!("Failed to spawn '{command}': {e}");
            Err(InitError::Spawn {
                command: command.to_string(),
                source: e,
            })
        }
    }
}
