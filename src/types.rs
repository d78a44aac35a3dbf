use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// How an empty include list is interpreted.
///
/// - `Required`: at least one include pattern must be configured, and a path
///   is only relevant when an include pattern matches it.
/// - `Implicit`: every path that is not excluded is relevant; include
///   patterns, when given, still narrow the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeMode {
    Required,
    Implicit,
}

impl Default for IncludeMode {
    fn default() -> Self {
        IncludeMode::Required
    }
}

impl FromStr for IncludeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "required" => Ok(IncludeMode::Required),
            "implicit" => Ok(IncludeMode::Implicit),
            other => Err(format!(
                "invalid include_mode: {other} (expected \"required\" or \"implicit\")"
            )),
        }
    }
}

/// Pattern language used for include/exclude lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternSyntax {
    /// Regular expressions, matched anywhere in the relative path.
    Regex,
    /// Shell-style globs, matched against the whole relative path.
    Glob,
}

impl Default for PatternSyntax {
    fn default() -> Self {
        PatternSyntax::Regex
    }
}

impl fmt::Display for PatternSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternSyntax::Regex => f.write_str("regex"),
            PatternSyntax::Glob => f.write_str("glob"),
        }
    }
}

/// What happens to the current child when autocmd itself is asked to exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitPolicy {
    /// Stop the child (interrupt, grace period, kill) before exiting.
    Terminate,
    /// Leave the child running and exit immediately.
    Orphan,
}

impl Default for ExitPolicy {
    fn default() -> Self {
        ExitPolicy::Terminate
    }
}

impl FromStr for ExitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "terminate" => Ok(ExitPolicy::Terminate),
            "orphan" => Ok(ExitPolicy::Orphan),
            other => Err(format!(
                "invalid on_exit: {other} (expected \"terminate\" or \"orphan\")"
            )),
        }
    }
}
