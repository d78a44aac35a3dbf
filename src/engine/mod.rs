// src/engine/mod.rs

//! Process supervision engine.
//!
//! The supervisor owns the lifecycle of the child command. It reacts to:
//! - restart signals coming out of the debouncer
//! - the child exiting on its own
//! - shutdown requests (Ctrl-C)
//!
//! Everything it needs from the OS goes through [`crate::exec`], so the
//! state machine in [`supervisor`] is driven with a fake spawner in tests.

use std::time::Duration;

use crate::config::ConfigFile;

/// A settled burst of relevant filesystem changes.
///
/// `trigger` is the relative path of the event whose timer closed the burst;
/// it is only used for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartSignal {
    pub trigger: String,
}

/// Events flowing into the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    Restart(RestartSignal),
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Observable supervisor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// No current process: either before the first start, after a failed
    /// start, or after the child exited on its own.
    Idle,
    Running,
    /// Interrupt/kill/wait in progress for the current process.
    Stopping,
}

/// How a running child is stopped before the next start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShutdownPolicy {
    /// Time between the interrupt and the kill. `None` skips the interrupt.
    pub grace_period: Option<Duration>,
    /// Pause between an observed exit and the next start.
    pub cooldown: Duration,
}

impl ShutdownPolicy {
    pub fn from_millis(sigint_ms: u64, between_ms: u64) -> Self {
        Self {
            grace_period: (sigint_ms > 0).then(|| Duration::from_millis(sigint_ms)),
            cooldown: Duration::from_millis(between_ms),
        }
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        let process = cfg.process();
        Self::from_millis(process.sigint_ms, process.between_ms)
    }
}

pub mod supervisor;

pub use supervisor::Supervisor;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sigint_skips_the_interrupt() {
        let policy = ShutdownPolicy::from_millis(0, 250);
        assert_eq!(policy.grace_period, None);
        assert_eq!(policy.cooldown, Duration::from_millis(250));

        let policy = ShutdownPolicy::from_millis(500, 0);
        assert_eq!(policy.grace_period, Some(Duration::from_millis(500)));
        assert!(policy.cooldown.is_zero());
    }
}
