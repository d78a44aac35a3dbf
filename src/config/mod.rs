// src/config/mod.rs

//! Configuration loading and validation for autocmd.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and layer CLI flags on top (`loader.rs`).
//! - Validate command, patterns and watch root (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{apply_cli_overrides, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, ProcessSection, RawConfigFile, WatchSection, DEFAULT_EXCLUDE,
    DEFAULT_GLOB_EXCLUDE,
};
pub use validate::validate_config;
