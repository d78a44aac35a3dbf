// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{AutocmdError, Result};
use crate::types::IncludeMode;
use crate::watch::patterns::PatternMatcher;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::AutocmdError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        let dir = raw.watch.dir.clone().ok_or_else(|| {
            AutocmdError::ConfigError("[watch].dir must be set".to_string())
        })?;
        let root = dir.canonicalize().map_err(|e| AutocmdError::WatchRoot {
            path: dir.clone(),
            reason: e.to_string(),
        })?;
        if !root.is_dir() {
            return Err(AutocmdError::WatchRoot {
                path: root,
                reason: "not a directory".to_string(),
            });
        }
        Ok(ConfigFile::new_unchecked(root, raw.watch, raw.process))
    }
}

/// Semantic checks that don't touch the filesystem.
///
/// Usage-level problems (no command, no mandatory include pattern) are
/// reported first so the caller can print usage text for them.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_command(cfg)?;
    ensure_has_include(cfg)?;
    validate_patterns(cfg)?;
    Ok(())
}

fn ensure_has_command(cfg: &RawConfigFile) -> Result<()> {
    match cfg.process.cmd.first() {
        Some(program) if !program.trim().is_empty() => Ok(()),
        _ => Err(AutocmdError::MissingArgument(
            "a command to run (positional or --cmd)".to_string(),
        )),
    }
}

fn ensure_has_include(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.include_mode == IncludeMode::Required && cfg.watch.include.is_empty() {
        return Err(AutocmdError::MissingArgument(
            "at least one include pattern after `--` (or use --include-mode implicit)"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    let syntax = cfg.watch.syntax;
    for pattern in cfg.watch.include.iter().chain(cfg.watch.effective_exclude().iter()) {
        PatternMatcher::compile(pattern, syntax)?;
    }
    Ok(())
}
