//! Signal blocking and forwarding for the PID-1 supervisor.
//!
//! The whole forwardable set is blocked with `sigprocmask` before the child
//! is spawned, so a signal arriving in the window between process creation
//! and the first event-loop iteration stays pending in the kernel queue
//! instead of hitting the default disposition. The event loop then drains
//! pending signals in arrival order with `sigwait`.

use nix::{
    errno::Errno,
    sys::signal::{SigSet, Signal, SigmaskHow, kill, killpg, sigprocmask},
    unistd::Pid,
};
use tracing::{debug, warn};

use crate::error::InitError;

/// The set of signals the supervisor intercepts.
///
/// Immutable after startup. Contains every catchable signal except the
/// synchronous fault signals, which must keep their default disposition so a
/// crash in the supervisor itself still dies the ordinary way. SIGCHLD is a
/// member but is consumed internally to drive the reaper, never forwarded.
#[derive(Debug, Clone)]
pub struct SignalSet {
    set: SigSet,
}

/// Signals that can never be caught or blocked.
fn is_uncatchable(sig: Signal) -> bool {
    matches!(sig, Signal::SIGKILL | Signal::SIGSTOP)
}

/// Synchronous fault signals the supervisor must act on itself rather than
/// intercept.
fn is_fault(sig: Signal) -> bool {
    matches!(
        sig,
        Signal::SIGILL
            | Signal::SIGTRAP
            | Signal::SIGABRT
            | Signal::SIGBUS
            | Signal::SIGFPE
            | Signal::SIGSEGV
            | Signal::SIGSYS
    )
}

impl SignalSet {
    /// Builds the full forwardable set.
    pub fn forwardable() -> Self {
        let mut set = SigSet::empty();
        for sig in Signal::iterator() {
            if is_uncatchable(sig) || is_fault(sig) {
                continue;
            }
            set.add(sig);
        }
        Self { set }
    }

    /// Returns whether `sig` is part of the set.
    pub fn contains(&self, sig: Signal) -> bool {
        self.set.contains(sig)
    }

    /// Blocks delivery of the whole set on the calling thread.
    ///
    /// Must run before the designated child is spawned so that no signal is
    /// dropped in the race between process creation and the event loop.
    pub fn block(&self) -> Result<(), InitError> {
        sigprocmask(SigmaskHow::SIG_BLOCK, Some(&self.set), None)
            .map_err(InitError::SignalSetup)
    }

    /// Blocks until one signal from the set is pending and takes it off the
    /// queue. Pending signals are consumed in arrival order.
    pub fn wait(&self) -> Result<Signal, InitError> {
        self.set.wait().map_err(InitError::SignalWait)
    }
}

/// Relays signals received by the supervisor to the designated child.
#[derive(Debug, Clone, Copy)]
pub struct SignalRelay {
    target: Pid,
    process_group: bool,
}

impl SignalRelay {
    /// Creates a relay for the given child PID. With `process_group` set
    /// (subreaper mode), signals target the child's whole process group so
    /// the entire subtree observes them.
    pub fn new(target: Pid, process_group: bool) -> Self {
        Self {
            target,
            process_group,
        }
    }

    /// Forwards one signal verbatim to the child.
    ///
    /// A missing target (ESRCH) is tolerated: the child may have exited
    /// between the signal arriving here and delivery. The eventual reap
    /// still decides the supervisor's exit code.
    pub fn forward(&self, sig: Signal) {
        let result = if self.process_group {
            killpg(self.target, sig)
        } else {
            kill(self.target, sig)
        };

        match result {
            Ok(()) => debug!("Forwarded {sig} to child {}", self.target),
            Err(Errno::ESRCH) => {
                debug!("Child {} already gone; dropping {sig}", self.target)
            }
            Err(err) => warn!("Failed to forward {sig} to child {}: {err}", self.target),
        }
    }
}
