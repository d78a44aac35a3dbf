// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::watch::debounce::Debouncer;
use crate::watch::enumerator::TreeEnumerator;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::PathFilter;
use crate::watch::source::{FsEvent, SourceMessage};

/// What handling a single event did. Mostly useful for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventOutcome {
    /// Directories newly registered because of this event.
    pub registered: usize,
    /// Whether the event started or extended the debounce window.
    pub debounced: bool,
}

/// Spawn the event-consumption loop.
///
/// Runs until the notification source drops its sender. Errors reported by
/// the source are logged and the loop keeps going.
pub fn spawn_watcher(
    enumerator: Arc<TreeEnumerator>,
    filter: Arc<PathFilter>,
    debouncer: Debouncer,
    mut source_rx: mpsc::UnboundedReceiver<SourceMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = source_rx.recv().await {
            match message {
                SourceMessage::Event(event) => {
                    handle_event(&event, &enumerator, &filter, &debouncer).await;
                }
                SourceMessage::Error(err) => {
                    warn!(error = %err, "file watch error");
                }
            }
        }
        debug!("watcher event loop finished");
    })
}

/// Process one filesystem event.
///
/// - Paths outside the watch root, and the root itself, are ignored.
/// - Paths that may be new directories are handed to the enumerator, which
///   applies the exclude rules itself. The walk runs on the blocking pool and
///   is awaited, so registration still happens in event order.
/// - Relevant paths start or extend the debounce window.
pub async fn handle_event(
    event: &FsEvent,
    enumerator: &Arc<TreeEnumerator>,
    filter: &PathFilter,
    debouncer: &Debouncer,
) -> EventOutcome {
    let mut outcome = EventOutcome::default();

    let Some(rel) = relative_str(enumerator.root(), &event.path) else {
        trace!(path = ?event.path, "event outside watch root; ignoring");
        return outcome;
    };
    if rel.is_empty() {
        trace!(kind = ?event.kind, "event on watch root; ignoring");
        return outcome;
    }

    if event.may_be_new() {
        outcome.registered = register_if_dir(enumerator, event.path.clone()).await;
    }

    if filter.is_relevant(&rel) {
        trace!(kind = ?event.kind, path = %rel, "file changed");
        debouncer.record(rel);
        outcome.debounced = true;
    }

    outcome
}

async fn register_if_dir(enumerator: &Arc<TreeEnumerator>, path: PathBuf) -> usize {
    let enumerator = Arc::clone(enumerator);
    let walked = tokio::task::spawn_blocking(move || {
        let registered = enumerator.register_created(&path);
        (path, registered)
    })
    .await;

    match walked {
        Ok((path, registered)) => {
            if registered > 0 {
                debug!(dir = ?path, registered, "watching new directory");
            }
            registered
        }
        Err(err) => {
            warn!(error = %err, "directory registration task failed");
            0
        }
    }
}
