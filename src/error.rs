//! Error handling for initg.
use thiserror::Error;

/// Exit code reported when the designated command could not be executed.
pub const EXIT_SPAWN_FAILURE: i32 = 127;

/// Exit code reported for internal supervisor faults.
pub const EXIT_INTERNAL_FAULT: i32 = 1;

/// Defines all possible errors that can occur in the supervisor.
///
/// Every variant is fatal: the supervisor never retries, since a PID 1 that
/// retries silently masks real failures from the orchestration layer above it.
#[derive(Debug, Error)]
pub enum InitError {
    /// The designated command could not be found or executed.
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        /// The command that failed to start.
        command: String,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// The descendant-wait primitive reported an error not explainable by
    /// "no children left".
    #[error("Failed to wait for descendants: {0}")]
    Wait(nix::errno::Errno),

    /// The designated child disappeared without being reaped through the
    /// normal path; its outcome is unavailable.
    #[error("Designated child vanished before its exit status could be collected")]
    ChildLost,

    /// Waiting for a pending signal failed.
    #[error("Failed to wait for signals: {0}")]
    SignalWait(nix::errno::Errno),

    /// Blocking the forwardable signal set failed during startup.
    #[error("Failed to block signal set: {0}")]
    SignalSetup(nix::errno::Errno),
}

impl InitError {
    /// Exit code the supervisor reports for this fault.
    ///
    /// A spawn failure exits 127 by shell convention; every other fault is an
    /// internal supervisor error and exits 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            InitError::Spawn { .. } => EXIT_SPAWN_FAILURE,
            _ => EXIT_INTERNAL_FAULT,
        }
    }
}
