// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::types::{ExitPolicy, IncludeMode, PatternSyntax};

/// Ignore list used when neither the config file nor `--ignore` gives one:
/// a top-level `tags` file (so a ctags run does not retrigger itself),
/// dotfiles/dot-directories, editor backups and database journals.
pub const DEFAULT_EXCLUDE: &[&str] = &[r"^/tags$", r"/\.", r"~$", r"\.db$", r"\.db-journal$"];

/// Glob spelling of [`DEFAULT_EXCLUDE`], used with `syntax = "glob"`.
pub const DEFAULT_GLOB_EXCLUDE: &[&str] =
    &["tags", "**/.*", "**/.*/**", "**/*~", "**/*.db", "**/*.db-journal"];

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [watch]
/// dir = "."
/// include = ['\.go$']
/// exclude = ['/\.']
/// wait_ms = 1000
///
/// [process]
/// cmd = ["go", "run", "."]
/// sigint_ms = 500
/// ```
///
/// All sections are optional and have reasonable defaults. CLI flags are
/// layered on top by the loader.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub process: ProcessSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Watch root. `None` means the current working directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Include patterns, evaluated in order.
    #[serde(default)]
    pub include: Vec<String>,

    /// Exclude patterns, evaluated in order before includes.
    ///
    /// `None` selects [`DEFAULT_EXCLUDE`] (or [`DEFAULT_GLOB_EXCLUDE`]); an
    /// explicit empty list disables excludes entirely.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,

    #[serde(default)]
    pub syntax: PatternSyntax,

    #[serde(default)]
    pub include_mode: IncludeMode,

    /// Debounce window in milliseconds.
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,
}

fn default_wait_ms() -> u64 {
    1000
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            dir: None,
            include: Vec::new(),
            exclude: None,
            syntax: PatternSyntax::default(),
            include_mode: IncludeMode::default(),
            wait_ms: default_wait_ms(),
        }
    }
}

impl WatchSection {
    /// Exclude patterns after applying the built-in default.
    pub fn effective_exclude(&self) -> Vec<String> {
        let defaults = match self.syntax {
            PatternSyntax::Regex => DEFAULT_EXCLUDE,
            PatternSyntax::Glob => DEFAULT_GLOB_EXCLUDE,
        };
        match &self.exclude {
            Some(list) => list.clone(),
            None => defaults.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// `[process]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessSection {
    /// Program and arguments.
    #[serde(default)]
    pub cmd: Vec<String>,

    /// Grace period between the interrupt and the kill; 0 skips the interrupt.
    #[serde(default)]
    pub sigint_ms: u64,

    /// Cooldown between an observed exit and the next start.
    #[serde(default)]
    pub between_ms: u64,

    #[serde(default)]
    pub on_exit: ExitPolicy,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`),
/// so holders can rely on:
/// - a non-empty command,
/// - patterns that compile,
/// - an include pattern whenever `include_mode = required`,
/// - a canonical, existing watch root.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    root: PathBuf,
    watch: WatchSection,
    process: ProcessSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        root: PathBuf,
        watch: WatchSection,
        process: ProcessSection,
    ) -> Self {
        Self {
            root,
            watch,
            process,
        }
    }

    /// Canonical watch root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn watch(&self) -> &WatchSection {
        &self.watch
    }

    pub fn process(&self) -> &ProcessSection {
        &self.process
    }

    pub fn command(&self) -> &[String] {
        &self.process.cmd
    }

    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.watch.wait_ms)
    }
}
