//! Configuration builder
//!
//! Merges configuration from files and CLI arguments.

use crate::config::file::CONFIG_ENV;
use crate::config::{Config, ConfigFile};
use crate::driver::DriverKind;
use crate::error::ConfigError;

use std::path::Path;

/// Builder for merging configuration sources
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Load configuration from a file
    ///
    /// An explicit path (argument or `ECTUNE_CONFIG`) must load; otherwise
    /// the default locations are searched and defaults kept if none match.
    pub fn with_file(mut self, path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(Into::into));

        let file_config = match explicit {
            Some(path) => Some(ConfigFile::load(path)?),
            None => ConfigFile::load_default(),
        };

        if let Some(cfg) = file_config {
            self.config = cfg;
        }

        Ok(self)
    }

    /// Override with CLI verbose flag
    pub fn with_verbose(mut self, verbose: Option<bool>) -> Self {
        if let Some(v) = verbose {
            self.config.general.verbose = v;
        }
        self
    }

    /// Override with CLI dry-run flag
    pub fn with_dry_run(mut self, dry_run: Option<bool>) -> Self {
        if let Some(d) = dry_run {
            self.config.general.dry_run = d;
        }
        self
    }

    /// Override with CLI driver kind
    pub fn with_driver(mut self, kind: Option<DriverKind>) -> Self {
        if let Some(k) = kind {
            self.config.driver.kind = k;
        }
        self
    }

    /// Override with CLI synthetic-monitoring flag
    pub fn with_synthetic(mut self, synthetic: Option<bool>) -> Self {
        if let Some(s) = synthetic {
            self.config.monitor.synthetic = s;
        }
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
