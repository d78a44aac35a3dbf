// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Two invocation shapes are accepted and may be mixed with a config file:
//!
//! ```text
//! autocmd [OPTIONS] <COMMAND>... -- <PATTERN>...
//! autocmd [OPTIONS] --cmd "ctags --recurse" --include-mode implicit
//! ```

use std::path::PathBuf;

use clap::{CommandFactory, Parser, ValueEnum};

use crate::types::{ExitPolicy, IncludeMode};

/// Command-line arguments for `autocmd`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "autocmd",
    version,
    about = "Re-run a command whenever matching files under a directory change.",
    long_about = None,
    override_usage = "autocmd [OPTIONS] <COMMAND>... -- <PATTERN>..."
)]
pub struct CliArgs {
    /// Optional TOML config file. CLI flags override its values.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory to watch (default: current working directory).
    #[arg(long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Command to run as a single whitespace-separated string.
    ///
    /// Alternative to giving the command as positional arguments.
    #[arg(long, value_name = "STRING")]
    pub cmd: Option<String>,

    /// Comma separated list of patterns to ignore.
    ///
    /// Pass an empty string to disable the built-in ignore list.
    #[arg(long, value_name = "PATTERNS")]
    pub ignore: Option<String>,

    /// Milliseconds to wait after the last change before restarting.
    #[arg(long, value_name = "MS")]
    pub wait: Option<u64>,

    /// Milliseconds to wait between stopping the command and starting it again.
    #[arg(long, value_name = "MS")]
    pub between: Option<u64>,

    /// If set, interrupt the command first and give it this many ms before
    /// killing it.
    #[arg(long, value_name = "MS")]
    pub sigint: Option<u64>,

    /// Verbosity, higher is more verbose. Give the level as `--verbose=N`;
    /// a bare `--verbose` means 1.
    #[arg(
        long,
        short = 'v',
        value_name = "N",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "1"
    )]
    pub verbose: Option<u8>,

    /// Whether at least one include pattern is mandatory.
    #[arg(long, value_name = "MODE")]
    pub include_mode: Option<IncludeMode>,

    /// Interpret include/ignore patterns as globs instead of regexes.
    #[arg(long)]
    pub glob: bool,

    /// What to do with the running command when autocmd is interrupted.
    #[arg(long, value_name = "POLICY")]
    pub on_exit: Option<ExitPolicy>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// Overrides `--verbose` and `AUTOCMD_LOG`.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the configuration, but don't watch or run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Command and arguments to run, optionally followed by `--` and the
    /// include patterns.
    ///
    /// Everything after the first positional is passed through verbatim, so
    /// options must come before the command.
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}

impl CliArgs {
    /// Positional command words (everything before `--`).
    ///
    /// Empty when `--cmd` is given and there is no `--` separator.
    pub fn command_words(&self) -> &[String] {
        self.split_positionals().0
    }

    /// Positional include patterns (everything after `--`).
    ///
    /// With `--cmd` and no separator every positional is a pattern, since
    /// clap swallows a leading `--`.
    pub fn pattern_args(&self) -> &[String] {
        self.split_positionals().1
    }

    /// Positional shapes that would otherwise be silently misread.
    pub fn positional_conflict(&self) -> Option<String> {
        let words = self.command_words();

        if self.cmd.is_some() && !words.is_empty() {
            return Some(format!(
                "--cmd and a positional command ({}) were both given",
                words.join(" ")
            ));
        }

        if self.verbose.is_some() {
            if let Some(level) = words.first().filter(|w| w.parse::<u8>().is_ok()) {
                return Some(format!(
                    "`--verbose {level}` runs `{level}` as the command; use --verbose={level}"
                ));
            }
        }

        None
    }

    fn split_positionals(&self) -> (&[String], &[String]) {
        if self.cmd.is_some() && !self.args.iter().any(|a| a == "--") {
            return (&[], self.args.as_slice());
        }
        split_on_separator(&self.args)
    }
}

fn split_on_separator(args: &[String]) -> (&[String], &[String]) {
    match args.iter().position(|a| a == "--") {
        Some(idx) => (&args[..idx], &args[idx + 1..]),
        None => (args, &[]),
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

/// Print usage text to stderr.
pub fn print_usage() {
    let help = CliArgs::command().render_help();
    eprintln!("{help}");
}
