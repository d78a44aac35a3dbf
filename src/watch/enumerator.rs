// src/watch/enumerator.rs

//! Directory tree registration.
//!
//! Walks the watch root breadth-first and registers every directory that
//! is not excluded with the notification source. Excluded directories are
//! pruned together with their whole subtree. The same walk is reused for
//! directories that appear while autocmd is running.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{trace, warn};

use crate::errors::{AutocmdError, Result};
use crate::fs::FileSystem;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::PathFilter;
use crate::watch::source::NotificationSource;

pub struct TreeEnumerator {
    root: PathBuf,
    filter: Arc<PathFilter>,
    source: Arc<dyn NotificationSource>,
    fs: Arc<dyn FileSystem>,
}

impl std::fmt::Debug for TreeEnumerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeEnumerator")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl TreeEnumerator {
    pub fn new(
        root: impl Into<PathBuf>,
        filter: Arc<PathFilter>,
        source: Arc<dyn NotificationSource>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            root: root.into(),
            filter,
            source,
            fs,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Register the root and every qualifying directory below it.
    ///
    /// Failing to register the root itself is fatal; everything below it is
    /// best effort. Returns the number of directories registered.
    pub fn enumerate_root(&self) -> Result<usize> {
        self.source
            .register(&self.root)
            .map_err(|e| AutocmdError::WatchRoot {
                path: self.root.clone(),
                reason: format!("{e:#}"),
            })?;
        trace!(dir = ?self.root, "watching");

        let mut seen = HashSet::new();
        seen.insert(self.identity(&self.root));

        let mut queue = VecDeque::new();
        self.enqueue_children(&self.root, &mut queue);
        Ok(1 + self.walk(queue, &mut seen))
    }

    /// Register a path that appeared after startup.
    ///
    /// Files are ignored (their parent directory is already watched). A new
    /// directory is registered along with whatever it already contains,
    /// unless it is excluded. Returns the number of directories registered.
    pub fn register_created(&self, path: &Path) -> usize {
        if !self.fs.is_dir(path) || !self.qualifies(path) {
            return 0;
        }
        let mut seen = HashSet::new();
        self.walk(VecDeque::from([path.to_path_buf()]), &mut seen)
    }

    fn walk(&self, mut queue: VecDeque<PathBuf>, seen: &mut HashSet<PathBuf>) -> usize {
        let mut registered = 0;

        while let Some(dir) = queue.pop_front() {
            // Symlinked directories can lead back up the tree.
            if !seen.insert(self.identity(&dir)) {
                continue;
            }

            if let Err(err) = self.source.register(&dir) {
                warn!(dir = ?dir, error = %format!("{err:#}"), "failed to watch directory; skipping");
                continue;
            }
            registered += 1;
            trace!(dir = ?dir, "watching");

            self.enqueue_children(&dir, &mut queue);
        }

        registered
    }

    fn enqueue_children(&self, dir: &Path, queue: &mut VecDeque<PathBuf>) {
        match self.fs.read_dir(dir) {
            Ok(entries) => {
                for entry in entries {
                    if self.fs.is_dir(&entry) && self.qualifies(&entry) {
                        queue.push_back(entry);
                    }
                }
            }
            Err(err) => {
                warn!(dir = ?dir, error = %format!("{err:#}"), "failed to list directory; skipping its children");
            }
        }
    }

    fn qualifies(&self, dir: &Path) -> bool {
        match relative_str(&self.root, dir) {
            Some(rel) => !self.filter.is_excluded(&rel),
            None => false,
        }
    }

    fn identity(&self, dir: &Path) -> PathBuf {
        self.fs
            .canonicalize(dir)
            .unwrap_or_else(|_| dir.to_path_buf())
    }
}
