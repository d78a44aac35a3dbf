// src/watch/debounce.rs

//! Sliding-window debouncing of relevant filesystem events.
//!
//! Every relevant event bumps a shared [`PendingCounter`] and spawns a timer
//! task. When a timer expires it decrements the counter; only the timer
//! that brings the counter back to zero emits a restart. Stale timers are
//! never cancelled, they simply find the counter still positive.
//!
//! The net effect: a burst of events whose gaps are all shorter than `wait`
//! produces exactly one restart, `wait` after the last event, regardless of
//! how the events interleave.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::engine::{RestartSignal, SupervisorEvent};

/// Number of debounce timers in flight.
#[derive(Debug, Default)]
pub struct PendingCounter {
    count: AtomicUsize,
}

impl PendingCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new timer; returns the count including it.
    pub fn increment(&self) -> usize {
        self.count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Retire a timer; true if it was the last one in flight.
    pub fn decrement_is_zero(&self) -> bool {
        self.count.fetch_sub(1, Ordering::AcqRel) == 1
    }

    pub fn get(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}

/// Turns relevant events into coalesced [`RestartSignal`]s.
///
/// Cheap to clone; clones share the same counter.
#[derive(Debug, Clone)]
pub struct Debouncer {
    pending: Arc<PendingCounter>,
    wait: Duration,
    events_tx: mpsc::Sender<SupervisorEvent>,
}

impl Debouncer {
    pub fn new(wait: Duration, events_tx: mpsc::Sender<SupervisorEvent>) -> Self {
        Self {
            pending: Arc::new(PendingCounter::new()),
            wait,
            events_tx,
        }
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Timers currently in flight.
    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    /// Start or extend the debounce window for a relevant event.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn record(&self, trigger: String) -> JoinHandle<()> {
        let in_flight = self.pending.increment();
        trace!(path = %trigger, in_flight, "debounce window extended");

        let pending = Arc::clone(&self.pending);
        let wait = self.wait;
        let events_tx = self.events_tx.clone();

        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            if pending.decrement_is_zero() {
                trace!(path = %trigger, "restart needed");
                emit(&events_tx, RestartSignal { trigger });
            }
        })
    }
}

/// Hand a restart to the supervisor without blocking.
///
/// The channel holds one event; if a restart is already queued the new one
/// is folded into it.
fn emit(events_tx: &mpsc::Sender<SupervisorEvent>, signal: RestartSignal) {
    let trigger = signal.trigger.clone();
    match events_tx.try_send(SupervisorEvent::Restart(signal)) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            debug!(path = %trigger, "restart already pending; coalescing");
        }
        Err(TrySendError::Closed(_)) => {
            warn!("supervisor channel closed; dropping restart");
        }
    }
}
