// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The supervisor talks to a [`ProcessSpawner`] instead of
//! `tokio::process::Command` directly. This makes it easy to swap in a fake
//! spawner in tests while keeping the production implementation in
//! [`super::process`].

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Success,
    Failed(i32),
    /// Ended by a signal, no exit code.
    Terminated,
}

/// A started child process.
pub trait ChildProcess: Send {
    /// OS process id, if still known.
    fn id(&self) -> Option<u32>;

    /// Ask the process to stop (SIGINT on unix).
    fn interrupt(&mut self) -> Result<()>;

    /// Forcefully terminate the process. Does not wait for it.
    fn kill(&mut self) -> Result<()>;

    /// Wait for the process to exit.
    ///
    /// Must be cancel-safe: the supervisor races this against incoming
    /// events and may drop the future.
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = Result<ProcessOutcome>> + Send + '_>>;
}

/// Trait abstracting how the command is started.
///
/// Production code uses [`super::TokioSpawner`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait ProcessSpawner: Send {
    /// Start `argv[0]` with `argv[1..]`, inheriting stdout and stderr.
    fn spawn(&mut self, argv: &[String]) -> Result<Box<dyn ChildProcess>>;
}
