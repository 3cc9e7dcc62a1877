//! Configuration system
//!
//! Handles TOML config file parsing and CLI argument merging.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::cli::args::OutputFormat;
use crate::nvml::EnumerationPolicy;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Native library location
    pub library: LibraryConfig,
    /// Device enumeration settings
    pub devices: DevicesConfig,
    /// Output settings
    pub output: OutputConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,
    /// env_logger filter used when RUST_LOG is unset
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_level: "warn".to_string(),
        }
    }
}

impl GeneralConfig {
    /// env_logger filter to start from; verbose always means debug
    pub fn log_filter(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}

/// Native library configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Explicit path to libnvidia-ml; the loader search path is used when unset
    pub path: Option<String>,
}

/// Device enumeration configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DevicesConfig {
    /// Fail when any device cannot be constructed instead of stopping early
    pub strict: bool,
}

impl DevicesConfig {
    pub fn policy(&self) -> EnumerationPolicy {
        if self.strict {
            EnumerationPolicy::Strict
        } else {
            EnumerationPolicy::BestEffort
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.log_level, "warn");
        assert!(config.library.path.is_none());
        assert_eq!(config.devices.policy(), EnumerationPolicy::BestEffort);
        assert_eq!(config.output.format, OutputFormat::Table);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [library]
            path = "/opt/nvidia/libnvidia-ml.so.1"

            [devices]
            strict = true

            [output]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.library.path.as_deref(),
            Some("/opt/nvidia/libnvidia-ml.so.1")
        );
        assert_eq!(config.devices.policy(), EnumerationPolicy::Strict);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(!config.general.verbose);
    }

    #[test]
    fn test_log_filter() {
        let mut general = GeneralConfig {
            log_level: "info".to_string(),
            ..GeneralConfig::default()
        };
        assert_eq!(general.log_filter(), "info");

        general.verbose = true;
        assert_eq!(general.log_filter(), "debug");
    }

    #[test]
    fn test_verbose_enables_debug_records() {
        let config = ConfigBuilder::new().with_verbose(Some(true)).build();
        let logger = env_logger::Builder::new()
            .parse_filters(config.general.log_filter())
            .build();
        assert_eq!(logger.filter(), log::LevelFilter::Debug);

        let quiet = env_logger::Builder::new()
            .parse_filters(Config::default().general.log_filter())
            .build();
        assert_eq!(quiet.filter(), log::LevelFilter::Warn);
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result: Result<Config, _> = toml::from_str("[output]\nformat = \"yaml\"\n");
        assert!(result.is_err());
    }
}
