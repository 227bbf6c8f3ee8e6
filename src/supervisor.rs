//! The PID-1 event loop.
//!
//! Single-threaded and single-process by design: signal-safe state mutation
//! across threads is a classic source of PID-1 bugs, so the supervisor
//! multiplexes its two event sources (pending signal delivery and
//! descendant-state change) through one blocking primitive, `sigwait` on the
//! pre-blocked forwardable mask. All handling runs to completion between
//! waits.

use std::time::Duration;

use nix::sys::signal::Signal;
use tracing::{info, warn};

use crate::{
    error::InitError,
    reaper::{self, Drained, ExitOutcome},
    signals::{SignalRelay, SignalSet},
    spawn::{self, DesignatedChild},
};

/// Default grace period for draining already-terminated stragglers once the
/// designated child has exited.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// Startup options for the supervisor.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorOptions {
    /// Register as a child subreaper so orphaned grandchildren reparent onto
    /// the supervisor instead of the namespace root, and signal the child's
    /// whole process group.
    pub subreaper: bool,
    /// How long to keep draining stragglers after the child terminates.
    pub grace_period: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            subreaper: false,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

/// Long-lived supervisor that owns the designated child for the lifetime of
/// the container.
///
/// The current-child state lives here as an explicit field and is passed by
/// reference into the reaper, never read from a process-wide global.
#[derive(Debug)]
pub struct Supervisor {
    child: DesignatedChild,
    signals: SignalSet,
    relay: SignalRelay,
    grace_period: Duration,
    outcome: Option<ExitOutcome>,
}

impl Supervisor {
    /// Blocks the forwardable signal set, applies subreaper mode if
    /// requested, and spawns the designated child.
    ///
    /// The mask must be in place before the child exists; a signal arriving
    /// during the spawn window stays pending and is flushed to the child from
    /// the first event-loop iteration.
    pub fn launch(
        command: &str,
        args: &[String],
        options: SupervisorOptions,
    ) -> Result<Self, InitError> {
        let signals = SignalSet::forwardable();
        signals.block()?;

        if options.subreaper {
            set_child_subreaper();
        }

        let child = spawn::spawn_designated(command, args, options.subreaper)?;
        info!("Supervising '{}' (PID {})", child.command(), child.pid());

        let relay = SignalRelay::new(child.pid(), options.subreaper);

        Ok(Self {
            child,
            signals,
            relay,
            grace_period: options.grace_period,
            outcome: None,
        })
    }

    /// Runs the event loop until the designated child terminates, then
    /// drains stragglers for the grace period and returns the exit code the
    /// supervisor must report.
    ///
    /// If the child never terminates, this never returns.
    pub fn run(mut self) -> Result<i32, InitError> {
        self.child.mark_running();

        while self.outcome.is_none() {
            match self.signals.wait()? {
                Signal::SIGCHLD => match reaper::drain(&mut self.child)? {
                    Drained::Quiet => {}
                    Drained::ChildExited(outcome) => self.record_outcome(outcome),
                },
                sig => self.relay.forward(sig),
            }
        }

        // The child is gone; give already-terminated stragglers a bounded
        // window to be collected before the process table disappears with us.
        reaper::drain_remaining(self.grace_period);

        let outcome = self.outcome.expect("loop exits only with an outcome");
        Ok(outcome.exit_code())
    }

    /// Records the child's terminal disposition. First write wins; reaps of
    /// unrelated descendants never reach this path.
    fn record_outcome(&mut self, outcome: ExitOutcome) {
        if self.outcome.is_some() {
            warn!("Ignoring duplicate exit outcome for designated child");
            return;
        }

        match outcome {
            ExitOutcome::Code(code) => {
                info!("Designated child exited with code {code}")
            }
            ExitOutcome::Signaled(sig) => {
                info!("Designated child terminated by {sig}")
            }
        }
        self.outcome = Some(outcome);
    }
}

/// Marks the supervisor as a subreaper: descendants orphaned by an
/// intermediate process reparent onto it instead of the namespace root, so
/// their zombies can still be collected.
#[cfg(target_os = "linux")]
fn set_child_subreaper() {
    if unsafe { libc::prctl(libc::PR_SET_CHILD_SUBREAPER, 1, 0, 0, 0) } < 0 {
        let err = std::io::Error::last_os_error();
        warn!("Failed to register as child subreaper: {err}");
    } else {
        tracing::debug!("Registered as child subreaper");
    }
}

#[cfg(not(target_os = "linux"))]
fn set_child_subreaper() {
    warn!("Subreaper mode is unsupported on this platform; orphans reparent to PID 1");
}
