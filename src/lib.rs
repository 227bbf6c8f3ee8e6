//! Initg is a minimal init process for containers. It runs as PID 1 inside an
//! isolated process namespace, launches exactly one designated child process,
//! forwards signals to it, reaps every descendant that terminates (including
//! orphans reparented onto PID 1), and exits with the child's own outcome so
//! that orchestration layers observing the container see the real exit status.

/// CLI interface.
pub mod cli;

/// Error handling.
pub mod error;

/// Zombie reaping and the designated child's exit outcome.
pub mod reaper;

/// Signal blocking and forwarding.
pub mod signals;

/// Designated child process creation.
pub mod spawn;

/// The PID-1 event loop tying spawn, relay, and reaper together.
pub mod supervisor;
