// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::cli::CliArgs;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{AutocmdError, Result};
use crate::types::PatternSyntax;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Layer CLI flags over a raw config. Flags that were not given leave the
/// file (or default) value untouched.
pub fn apply_cli_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if let Some(dir) = &args.dir {
        raw.watch.dir = Some(dir.clone());
    }

    if let Some(cmd) = &args.cmd {
        raw.process.cmd = cmd.split_whitespace().map(str::to_string).collect();
    } else if !args.command_words().is_empty() {
        raw.process.cmd = args.command_words().to_vec();
    }

    if !args.pattern_args().is_empty() {
        raw.watch.include = args.pattern_args().to_vec();
    }

    if let Some(ignore) = &args.ignore {
        raw.watch.exclude = Some(split_pattern_list(ignore));
    }

    if let Some(wait) = args.wait {
        raw.watch.wait_ms = wait;
    }
    if let Some(between) = args.between {
        raw.process.between_ms = between;
    }
    if let Some(sigint) = args.sigint {
        raw.process.sigint_ms = sigint;
    }
    if let Some(mode) = args.include_mode {
        raw.watch.include_mode = mode;
    }
    if args.glob {
        raw.watch.syntax = PatternSyntax::Glob;
    }
    if let Some(policy) = args.on_exit {
        raw.process.on_exit = policy;
    }
}

/// Split a comma separated pattern list, dropping empty entries.
pub fn split_pattern_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve the effective configuration from CLI arguments.
///
/// - Rejects ambiguous positional arguments (see [`CliArgs::positional_conflict`]).
/// - Reads the TOML file named by `--config`, if any.
/// - Applies CLI overrides.
/// - Falls back to the current working directory as the watch root.
/// - Validates the result (see `validate.rs`).
pub fn load_and_validate(args: &CliArgs) -> Result<ConfigFile> {
    if let Some(conflict) = args.positional_conflict() {
        return Err(AutocmdError::ConfigError(conflict));
    }

    let mut raw = match &args.config {
        Some(path) => load_from_path(path)?,
        None => RawConfigFile::default(),
    };

    apply_cli_overrides(&mut raw, args);

    if raw.watch.dir.is_none() {
        let cwd = std::env::current_dir().context("determining current working directory")?;
        raw.watch.dir = Some(cwd);
    }

    ConfigFile::try_from(raw)
}
