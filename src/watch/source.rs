// src/watch/source.rs

//! Filesystem notification source.
//!
//! The rest of the watcher only needs two things from the OS: a way to
//! register a directory, and a stream of create/modify/remove/rename events
//! for registered directories. [`NotificationSource`] is the registration
//! half; events arrive on an unbounded channel of [`SourceMessage`]s.
//!
//! [`NotifySource`] is the production implementation on top of `notify`.
//! Registration is non-recursive: the tree enumerator decides which
//! directories are watched so that excluded subtrees are never registered.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context};
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Create,
    Modify,
    Remove,
    Rename,
}

/// One filesystem change for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub path: PathBuf,
}

impl FsEvent {
    pub fn new(kind: FsEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Whether the path may have just appeared in the tree and therefore
    /// needs registering. Renames count, since a directory moved in from
    /// elsewhere is new to us.
    pub fn may_be_new(&self) -> bool {
        matches!(self.kind, FsEventKind::Create | FsEventKind::Rename)
    }
}

/// What the notification source delivers.
#[derive(Debug)]
pub enum SourceMessage {
    Event(FsEvent),
    /// The source failed to deliver an event. Logged and skipped.
    Error(String),
}

/// Registration half of the notification source.
///
/// Implementations must be safe to call from both the startup walk and the
/// event loop; registration is additive only.
pub trait NotificationSource: Send + Sync {
    fn register(&self, path: &Path) -> anyhow::Result<()>;
}

/// `notify`-backed notification source.
pub struct NotifySource {
    watcher: Mutex<RecommendedWatcher>,
}

impl std::fmt::Debug for NotifySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifySource").finish_non_exhaustive()
    }
}

impl NotifySource {
    /// Create the OS watcher. Failure here is fatal for the program.
    pub fn new() -> Result<(Self, mpsc::UnboundedReceiver<SourceMessage>)> {
        let (tx, rx) = mpsc::unbounded_channel::<SourceMessage>();

        // Closure called synchronously by notify whenever an event arrives.
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let messages = match res {
                    Ok(event) => translate(event)
                        .into_iter()
                        .map(SourceMessage::Event)
                        .collect(),
                    Err(err) => vec![SourceMessage::Error(err.to_string())],
                };
                for msg in messages {
                    if tx.send(msg).is_err() {
                        // Receiver gone: the event loop has shut down.
                        return;
                    }
                }
            },
            Config::default(),
        )?;

        Ok((
            Self {
                watcher: Mutex::new(watcher),
            },
            rx,
        ))
    }
}

impl NotificationSource for NotifySource {
    fn register(&self, path: &Path) -> anyhow::Result<()> {
        let mut watcher = self
            .watcher
            .lock()
            .map_err(|_| anyhow!("notify watcher mutex poisoned"))?;
        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .with_context(|| format!("registering {:?}", path))
    }
}

/// Flatten a `notify` event into one [`FsEvent`] per path.
///
/// Access events (open, read, close) are dropped: a command that merely
/// reads its sources must not restart itself.
pub fn translate(event: Event) -> Vec<FsEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => FsEventKind::Create,
        EventKind::Modify(ModifyKind::Name(_)) => FsEventKind::Rename,
        EventKind::Modify(_) | EventKind::Any => FsEventKind::Modify,
        EventKind::Remove(_) => FsEventKind::Remove,
        EventKind::Access(_) | EventKind::Other => return Vec::new(),
    };

    event
        .paths
        .into_iter()
        .map(|path| FsEvent::new(kind, path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RenameMode};

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |ev, p| ev.add_path(PathBuf::from(p)))
    }

    #[test]
    fn create_and_metadata_changes_are_kept() {
        let created = translate(event(EventKind::Create(CreateKind::Folder), &["/p/new"]));
        assert_eq!(created, vec![FsEvent::new(FsEventKind::Create, "/p/new")]);
        assert!(created[0].may_be_new());

        let touched = translate(event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)),
            &["/p/main.go"],
        ));
        assert_eq!(touched, vec![FsEvent::new(FsEventKind::Modify, "/p/main.go")]);
        assert!(!touched[0].may_be_new());
    }

    #[test]
    fn renames_yield_one_event_per_path() {
        let renamed = translate(event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/p/old", "/p/new"],
        ));
        assert_eq!(renamed.len(), 2);
        assert!(renamed.iter().all(|e| e.kind == FsEventKind::Rename));
    }

    #[test]
    fn access_events_are_dropped() {
        let read = translate(event(EventKind::Access(AccessKind::Any), &["/p/main.go"]));
        assert!(read.is_empty());

        let written = translate(event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/p/main.go"],
        ));
        assert_eq!(written.len(), 1);
    }
}
