use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Result};

use autocmd::watch::NotificationSource;

/// A notification source that only remembers what was registered.
///
/// Paths passed to [`RecordingSource::fail_on`] are rejected, which is how
/// tests exercise the "skip and keep going" behaviour of the tree walk.
#[derive(Default)]
pub struct RecordingSource {
    registered: Mutex<Vec<PathBuf>>,
    failing: Mutex<HashSet<PathBuf>>,
}

impl RecordingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.failing.lock().unwrap().insert(path.into());
    }

    /// Registered paths, in registration order.
    pub fn registered(&self) -> Vec<PathBuf> {
        self.registered.lock().unwrap().clone()
    }

    pub fn is_registered(&self, path: &Path) -> bool {
        self.registered.lock().unwrap().iter().any(|p| p == path)
    }
}

impl NotificationSource for RecordingSource {
    fn register(&self, path: &Path) -> Result<()> {
        if self.failing.lock().unwrap().contains(path) {
            bail!("refusing to watch {path:?}");
        }
        self.registered.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}
