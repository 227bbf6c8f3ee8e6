//! Zombie reaping and exit-outcome collection.
//!
//! As PID 1 (or a subreaper), the supervisor is the parent of last resort:
//! every descendant orphaned by an intermediate process reparents onto it and
//! must be collected to free its process-table slot. The reaper is the sole
//! caller of the wait primitive, so the process table needs no lock
//! discipline.

use std::time::{Duration, Instant};

use nix::{
    errno::Errno,
    sys::{
        signal::Signal,
        wait::{WaitPidFlag, WaitStatus, waitpid},
    },
    unistd::Pid,
};
use tracing::{debug, warn};

use crate::{error::InitError, spawn::DesignatedChild};

/// Interval between wait attempts while draining stragglers after the
/// designated child has terminated.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The terminal disposition of the designated child.
///
/// Recorded exactly once, on the child's first and only termination; reaps of
/// unrelated descendants never overwrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Normal exit with the given code (0-255).
    Code(i32),
    /// Termination by the given signal.
    Signaled(Signal),
}

impl ExitOutcome {
    /// Derives an outcome from a wait status, if the status is terminal.
    pub fn from_status(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(_, code) => Some(ExitOutcome::Code(code)),
            WaitStatus::Signaled(_, sig, _) => Some(ExitOutcome::Signaled(sig)),
            _ => None,
        }
    }

    /// The supervisor's own exit code for this outcome.
    ///
    /// A normal exit passes the child's code through unchanged; a
    /// signal-caused termination uses the shell convention of 128 plus the
    /// signal number, so orchestration layers can distinguish crash-by-signal
    /// from normal exit.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitOutcome::Code(code) => *code,
            ExitOutcome::Signaled(sig) => 128 + *sig as i32,
        }
    }
}

/// One descendant collected by a reap. Transient; exists only for the
/// duration of the reap event.
#[derive(Debug, Clone, Copy)]
pub struct ReapedDescendant {
    /// Process identifier of the collected descendant.
    pub pid: Pid,
    /// The wait status it was collected with.
    pub status: WaitStatus,
}

/// Result of one drain pass over the process table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drained {
    /// No terminated descendant remained; wait for the next notification.
    Quiet,
    /// The designated child was among the reaped descendants.
    ChildExited(ExitOutcome),
}

/// Reaps every descendant that has terminated, regardless of whether it is
/// the designated child.
///
/// Runs until the wait primitive reports nothing left to collect. A reap
/// matching the designated child records its outcome and transitions it to
/// `Terminated`; non-matching reaps are discarded after collection, their
/// sole purpose being to free the zombie slot.
///
/// ECHILD is benign once the designated child has terminated. If it is
/// reported while the child is still nominally alive, the child vanished
/// without being reaped through the normal path; that is `ChildLost`, and
/// failing loudly beats hanging forever.
pub fn drain(child: &mut DesignatedChild) -> Result<Drained, InitError> {
    let mut outcome = None;

    loop {
        let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED;
        match waitpid(Pid::from_raw(-1), Some(flags)) {
            Ok(WaitStatus::StillAlive) => break,
            Ok(status @ (WaitStatus::Stopped(..) | WaitStatus::Continued(_))) => {
                // A stop is a state change, not a termination; nothing to free.
                debug!("Descendant changed state without terminating: {status:?}");
            }
            #[cfg(any(target_os = "linux", target_os = "android"))]
            Ok(WaitStatus::PtraceEvent(..) | WaitStatus::PtraceSyscall(_)) => {}
            Ok(status) => {
                let reaped = ReapedDescendant {
                    pid: status.pid().unwrap_or(Pid::from_raw(-1)),
                    status,
                };

                if reaped.pid == child.pid() && !child.is_terminated() {
                    child.mark_terminated();
                    outcome = ExitOutcome::from_status(reaped.status);
                    debug!(
                        "Designated child {} terminated: {:?}",
                        reaped.pid, reaped.status
                    );
                } else {
                    debug!("Reaped orphaned descendant {}: {:?}", reaped.pid, reaped.status);
                }
            }
            Err(Errno::ECHILD) => {
                if child.is_terminated() || outcome.is_some() {
                    break;
                }
                return Err(InitError::ChildLost);
            }
            Err(err) => return Err(InitError::Wait(err)),
        }
    }

    Ok(outcome.map(Drained::ChildExited).unwrap_or(Drained::Quiet))
}

/// Drains already-terminated stragglers for a bounded grace period after the
/// designated child has exited.
///
/// Best-effort cleanup, not absolute: once the deadline elapses the
/// supervisor exits regardless of outstanding unreaped descendants.
pub fn drain_remaining(grace_period: Duration) {
    let deadline = Instant::now() + grace_period;

    loop {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => {
                if Instant::now() >= deadline {
                    debug!("Grace period elapsed with descendants still running");
                    break;
                }
                std::thread::sleep(DRAIN_POLL_INTERVAL);
            }
            Ok(status) => {
                if let Some(pid) = status.pid() {
                    debug!("Reaped straggler {pid}: {status:?}");
                }
            }
            Err(Errno::ECHILD) => break,
            Err(err) => {
                warn!("Wait failed while draining stragglers: {err}");
                break;
            }
        }
    }
}
