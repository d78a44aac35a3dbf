// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutocmdError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Cannot watch root {path:?}: {reason}")]
    WatchRoot { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Notification source error: {0}")]
    Notify(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AutocmdError {
    /// Missing command / pattern arguments print usage instead of failing.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, AutocmdError::MissingArgument(_))
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AutocmdError>;
