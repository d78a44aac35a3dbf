// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling include / exclude patterns into a [`PathFilter`].
//! - Registering the directory tree with the notification source, both at
//!   startup and as new directories appear.
//! - Coalescing bursts of relevant events into single restart signals.
//!
//! It does **not** know about processes; it only turns filesystem changes
//! into [`crate::engine::SupervisorEvent::Restart`]s.

pub mod debounce;
pub mod enumerator;
pub mod path_utils;
pub mod patterns;
pub mod source;
pub mod watcher;

pub use debounce::{Debouncer, PendingCounter};
pub use enumerator::TreeEnumerator;
pub use patterns::{PathFilter, PatternMatcher};
pub use source::{FsEvent, FsEventKind, NotificationSource, NotifySource, SourceMessage};
pub use watcher::{handle_event, spawn_watcher, EventOutcome};
