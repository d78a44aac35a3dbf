// src/logging.rs

//! Logging setup for `autocmd` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `--verbose` level (if provided)
//! 3. `AUTOCMD_LOG` environment variable (e.g. "info", "debug")
//! 4. default to `warn`
//!
//! Logs are sent to STDERR. The child command inherits both standard
//! streams, so its own output interleaves with ours.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>, verbose: Option<u8>) -> Result<()> {
    let level = resolve_level(
        cli_level,
        verbose,
        std::env::var("AUTOCMD_LOG").ok().as_deref(),
    );

    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn resolve_level(
    cli_level: Option<LogLevel>,
    verbose: Option<u8>,
    env_level: Option<&str>,
) -> tracing::Level {
    if let Some(lvl) = cli_level {
        return level_from_log_level(lvl);
    }
    if let Some(v) = verbose {
        return level_from_verbosity(v);
    }
    env_level
        .and_then(parse_level_str)
        .unwrap_or(tracing::Level::WARN)
}

/// Map the numeric `--verbose` level onto tracing levels.
///
/// Process starts log at INFO, stops at DEBUG and per-file noise at TRACE.
pub fn level_from_verbosity(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
