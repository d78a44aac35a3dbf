// src/engine/supervisor.rs

use std::fmt;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::exec::{ChildProcess, ProcessOutcome, ProcessSpawner};
use crate::types::ExitPolicy;

use super::{RestartSignal, ShutdownPolicy, SupervisorEvent, SupervisorState};

/// The instance the supervisor currently considers alive.
struct CurrentProcess {
    child: Box<dyn ChildProcess>,
    pid: Option<u32>,
    started_at: Instant,
}

/// Why the supervisor woke up while a process was (maybe) running.
enum Wakeup {
    Restart(RestartSignal),
    Shutdown,
}

/// Owns the child command: starts it, waits for a restart signal or its
/// exit, and on restart stops it (interrupt, grace period, kill, wait)
/// before starting a fresh instance.
///
/// At most one process is current at any time, and a new one is only
/// started after the previous one's exit has been observed.
pub struct Supervisor<S: ProcessSpawner> {
    command: Vec<String>,
    spawner: S,
    policy: ShutdownPolicy,
    on_exit: ExitPolicy,
    events_rx: mpsc::Receiver<SupervisorEvent>,
    state_tx: watch::Sender<SupervisorState>,
    current: Option<CurrentProcess>,
}

impl<S: ProcessSpawner> fmt::Debug for Supervisor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("command", &self.command)
            .field("policy", &self.policy)
            .field("on_exit", &self.on_exit)
            .field("state", &*self.state_tx.borrow())
            .finish_non_exhaustive()
    }
}

impl<S: ProcessSpawner> Supervisor<S> {
    pub fn new(
        command: Vec<String>,
        spawner: S,
        policy: ShutdownPolicy,
        on_exit: ExitPolicy,
        events_rx: mpsc::Receiver<SupervisorEvent>,
    ) -> Self {
        let (state_tx, _) = watch::channel(SupervisorState::Idle);
        Self {
            command,
            spawner,
            policy,
            on_exit,
            events_rx,
            state_tx,
            current: None,
        }
    }

    /// Follow state transitions from outside the run loop.
    pub fn subscribe(&self) -> watch::Receiver<SupervisorState> {
        self.state_tx.subscribe()
    }

    /// Main loop.
    ///
    /// Returns after a shutdown request or once every event sender is gone.
    /// Depending on [`ExitPolicy`] the current process is stopped first or
    /// left running.
    pub async fn run(mut self) -> Result<()> {
        self.start();

        loop {
            match self.next_wakeup().await {
                Wakeup::Restart(signal) => {
                    self.stop(Some(&signal.trigger)).await;
                    if !self.policy.cooldown.is_zero() {
                        debug!(cooldown = ?self.policy.cooldown, "waiting before restart");
                        tokio::time::sleep(self.policy.cooldown).await;
                    }
                    self.start();
                }
                Wakeup::Shutdown => break,
            }
        }

        match self.on_exit {
            ExitPolicy::Terminate => self.stop(None).await,
            ExitPolicy::Orphan => {
                if let Some(current) = self.current.take() {
                    info!(pid = ?current.pid, "leaving command running");
                }
            }
        }

        info!("supervisor exiting");
        Ok(())
    }

    /// Wait for the next restart or shutdown, observing a natural exit of
    /// the current process on the way.
    async fn next_wakeup(&mut self) -> Wakeup {
        enum Woken {
            Event(Option<SupervisorEvent>),
            Exited(anyhow::Result<ProcessOutcome>),
        }

        loop {
            let woken = match self.current.as_mut() {
                Some(current) => tokio::select! {
                    event = self.events_rx.recv() => Woken::Event(event),
                    outcome = current.child.wait() => Woken::Exited(outcome),
                },
                None => Woken::Event(self.events_rx.recv().await),
            };

            match woken {
                Woken::Exited(outcome) => {
                    if let Some(current) = self.current.take() {
                        log_exit(&current, outcome, None);
                    }
                    self.set_state(SupervisorState::Idle);
                }
                Woken::Event(Some(SupervisorEvent::Restart(signal))) => {
                    return Wakeup::Restart(signal);
                }
                Woken::Event(Some(SupervisorEvent::ShutdownRequested)) => {
                    info!("shutdown requested");
                    return Wakeup::Shutdown;
                }
                Woken::Event(None) => {
                    debug!("supervisor event channel closed");
                    return Wakeup::Shutdown;
                }
            }
        }
    }

    /// Idle -> Running. A failed start is logged and leaves the supervisor
    /// idle until the next restart signal.
    fn start(&mut self) {
        match self.spawner.spawn(&self.command) {
            Ok(child) => {
                let pid = child.id();
                info!(cmd = ?self.command, pid = ?pid, "running command");
                self.current = Some(CurrentProcess {
                    child,
                    pid,
                    started_at: Instant::now(),
                });
                self.set_state(SupervisorState::Running);
            }
            Err(err) => {
                error!(
                    cmd = ?self.command,
                    error = %format!("{err:#}"),
                    "failed to start command; waiting for the next change"
                );
                self.set_state(SupervisorState::Idle);
            }
        }
    }

    /// Running -> Stopping -> Idle.
    async fn stop(&mut self, trigger: Option<&str>) {
        let Some(mut current) = self.current.take() else {
            debug!(trigger, "no running process to stop");
            return;
        };

        self.set_state(SupervisorState::Stopping);
        debug!(cmd = ?self.command, pid = ?current.pid, trigger, "killing command");

        if let Some(grace) = self.policy.grace_period {
            if let Err(err) = current.child.interrupt() {
                warn!(pid = ?current.pid, error = %format!("{err:#}"), "unable to interrupt process");
            }
            tokio::time::sleep(grace).await;
        }

        if let Err(err) = current.child.kill() {
            warn!(pid = ?current.pid, error = %format!("{err:#}"), "unable to kill process");
        }

        let outcome = current.child.wait().await;
        log_exit(&current, outcome, trigger);
        self.set_state(SupervisorState::Idle);
    }

    fn set_state(&self, next: SupervisorState) {
        let prev = self.state_tx.send_replace(next);
        if prev != next {
            debug!(from = ?prev, to = ?next, "supervisor state transition");
        }
    }
}

fn log_exit(
    current: &CurrentProcess,
    outcome: anyhow::Result<ProcessOutcome>,
    trigger: Option<&str>,
) {
    let uptime = current.started_at.elapsed();
    match outcome {
        Ok(outcome) => debug!(
            pid = ?current.pid,
            ?outcome,
            ?uptime,
            trigger,
            "process exited"
        ),
        Err(err) => warn!(
            pid = ?current.pid,
            error = %format!("{err:#}"),
            trigger,
            "failed to wait for process"
        ),
    }
}
