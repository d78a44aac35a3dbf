// src/watch/patterns.rs

use std::fmt;

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::config::ConfigFile;
use crate::errors::{AutocmdError, Result};
use crate::types::{IncludeMode, PatternSyntax};

/// A single compiled include or exclude pattern.
///
/// Patterns are matched against paths relative to the watch root, spelled
/// with a leading slash: `"/src/main.go"`. Regexes see that string as is, so
/// `/\.` catches every dot-directory at any depth. Globs see it without the
/// leading slash so that `src/**/*.go` reads naturally.
#[derive(Clone)]
pub enum PatternMatcher {
    Regex(Regex),
    Glob { source: String, matcher: GlobMatcher },
}

impl PatternMatcher {
    pub fn compile(pattern: &str, syntax: PatternSyntax) -> Result<Self> {
        match syntax {
            PatternSyntax::Regex => Regex::new(pattern)
                .map(PatternMatcher::Regex)
                .map_err(|e| AutocmdError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                }),
            PatternSyntax::Glob => Glob::new(pattern)
                .map(|g| PatternMatcher::Glob {
                    source: pattern.to_string(),
                    matcher: g.compile_matcher(),
                })
                .map_err(|e| AutocmdError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    pub fn is_match(&self, rel_path: &str) -> bool {
        match self {
            PatternMatcher::Regex(re) => re.is_match(rel_path),
            PatternMatcher::Glob { matcher, .. } => {
                matcher.is_match(rel_path.trim_start_matches('/'))
            }
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PatternMatcher::Regex(re) => re.as_str(),
            PatternMatcher::Glob { source, .. } => source,
        }
    }
}

impl fmt::Debug for PatternMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

/// Decides whether a relative path is relevant.
///
/// Excludes are checked first and win over includes. Immutable after
/// construction and shared read-only between the tree enumerator and the
/// event loop.
#[derive(Clone)]
pub struct PathFilter {
    include: Vec<PatternMatcher>,
    exclude: Vec<PatternMatcher>,
    mode: IncludeMode,
}

impl fmt::Debug for PathFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathFilter")
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field("mode", &self.mode)
            .finish()
    }
}

impl PathFilter {
    pub fn new(
        include: &[String],
        exclude: &[String],
        syntax: PatternSyntax,
        mode: IncludeMode,
    ) -> Result<Self> {
        let compile_all = |patterns: &[String]| -> Result<Vec<PatternMatcher>> {
            patterns
                .iter()
                .map(|p| PatternMatcher::compile(p, syntax))
                .collect()
        };

        Ok(Self {
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
            mode,
        })
    }

    /// Build the filter for a validated config.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let watch = cfg.watch();
        Self::new(
            &watch.include,
            &watch.effective_exclude(),
            watch.syntax,
            watch.include_mode,
        )
    }

    /// True if any exclude pattern matches. Used on its own for directory
    /// pruning, where include patterns (usually file-shaped) don't apply.
    pub fn is_excluded(&self, rel_path: &str) -> bool {
        self.exclude.iter().any(|p| p.is_match(rel_path))
    }

    /// Exclude-then-include decision for a path relative to the watch root.
    pub fn is_relevant(&self, rel_path: &str) -> bool {
        if self.is_excluded(rel_path) {
            return false;
        }
        if self.include.is_empty() {
            return self.mode == IncludeMode::Implicit;
        }
        self.include.iter().any(|p| p.is_match(rel_path))
    }

    pub fn include_patterns(&self) -> impl Iterator<Item = &str> {
        self.include.iter().map(PatternMatcher::as_str)
    }

    pub fn exclude_patterns(&self) -> impl Iterator<Item = &str> {
        self.exclude.iter().map(PatternMatcher::as_str)
    }
}
