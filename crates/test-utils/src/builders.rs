#![allow(dead_code)]

use std::path::Path;

use autocmd::config::{ConfigFile, RawConfigFile};
use autocmd::types::{ExitPolicy, IncludeMode, PatternSyntax};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the same defaults as an empty TOML file, rooted at `dir`.
pub struct SettingsBuilder {
    config: RawConfigFile,
}

impl SettingsBuilder {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let mut config = RawConfigFile::default();
        config.watch.dir = Some(dir.as_ref().to_path_buf());
        Self { config }
    }

    pub fn cmd(mut self, argv: &[&str]) -> Self {
        self.config.process.cmd = argv.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn include(mut self, pattern: &str) -> Self {
        self.config.watch.include.push(pattern.to_string());
        self
    }

    /// Add an exclude pattern. The first call replaces the default list.
    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config
            .watch
            .exclude
            .get_or_insert_with(Vec::new)
            .push(pattern.to_string());
        self
    }

    pub fn no_excludes(mut self) -> Self {
        self.config.watch.exclude = Some(Vec::new());
        self
    }

    pub fn glob(mut self) -> Self {
        self.config.watch.syntax = PatternSyntax::Glob;
        self
    }

    pub fn implicit_include(mut self) -> Self {
        self.config.watch.include_mode = IncludeMode::Implicit;
        self
    }

    pub fn wait_ms(mut self, ms: u64) -> Self {
        self.config.watch.wait_ms = ms;
        self
    }

    pub fn sigint_ms(mut self, ms: u64) -> Self {
        self.config.process.sigint_ms = ms;
        self
    }

    pub fn between_ms(mut self, ms: u64) -> Self {
        self.config.process.between_ms = ms;
        self
    }

    pub fn on_exit(mut self, policy: ExitPolicy) -> Self {
        self.config.process.on_exit = policy;
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}
