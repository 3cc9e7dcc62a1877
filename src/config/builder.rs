//! Configuration builder
//!
//! Merges configuration from files and CLI arguments.

use crate::cli::args::OutputFormat;
use crate::config::{Config, ConfigFile};
use crate::error::ConfigError;

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
    /// An explicit path must exist and parse. Without one, the first readable
    /// default location wins and defaults apply when there is none.
    pub fn with_file(mut self, path: Option<&str>) -> Result<Self, ConfigError> {
        let file_config = match path {
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

    /// Override with CLI library path
    pub fn with_library(mut self, path: Option<String>) -> Self {
        if let Some(p) = path {
            self.config.library.path = Some(p);
        }
        self
    }

    /// Override with CLI strict flag
    pub fn with_strict(mut self, strict: Option<bool>) -> Self {
        if let Some(s) = strict {
            self.config.devices.strict = s;
        }
        self
    }

    /// Override with CLI output format
    pub fn with_format(mut self, format: Option<OutputFormat>) -> Self {
        if let Some(f) = format {
            self.config.output.format = f;
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builder_defaults() {
        let config = ConfigBuilder::new().build();
        assert!(!config.general.verbose);
        assert!(!config.devices.strict);
    }

    #[test]
    fn test_builder_overrides() {
        let config = ConfigBuilder::new()
            .with_verbose(Some(true))
            .with_library(Some("/tmp/libnvidia-ml.so".to_string()))
            .with_strict(Some(true))
            .with_format(Some(OutputFormat::Json))
            .build();

        assert!(config.general.verbose);
        assert_eq!(config.library.path.as_deref(), Some("/tmp/libnvidia-ml.so"));
        assert!(config.devices.strict);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[devices]\nstrict = true\n[output]\nformat = \"json\"").unwrap();

        let config = ConfigBuilder::new()
            .with_file(file.path().to_str())
            .unwrap()
            .with_format(Some(OutputFormat::Table))
            .with_strict(None)
            .build();

        assert!(config.devices.strict);
        assert_eq!(config.output.format, OutputFormat::Table);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = ConfigBuilder::new().with_file(Some("/nonexistent/nvtel.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
