//! Configuration file loading
//!
//! Handles loading configuration from TOML files.

use crate::config::Config;
use crate::error::ConfigError;

use std::path::{Path, PathBuf};

/// Configuration file handler
pub struct ConfigFile;

impl ConfigFile {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load_default() -> Option<Config> {
        for path in Self::default_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load(&path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    return Some(config);
                }
                Err(e) => log::warn!("Ignoring {}: {}", path.display(), e),
            }
        }
        None
    }

    /// Get default configuration file paths in search order; the first
    /// readable one is used
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("/etc/nvtel/config.toml")];

        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("nvtel").join("config.toml"));
        }

        paths.push(PathBuf::from("nvtel.toml"));
        paths.push(PathBuf::from(".nvtel.toml"));

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_paths_search_order() {
        let paths = ConfigFile::default_paths();
        assert_eq!(paths[0], PathBuf::from("/etc/nvtel/config.toml"));
        let n = paths.len();
        assert_eq!(paths[n - 2], PathBuf::from("nvtel.toml"));
        assert_eq!(paths[n - 1], PathBuf::from(".nvtel.toml"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ConfigFile::load("/nonexistent/path/config.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[devices\nstrict = ").unwrap();
        let result = ConfigFile::load(file.path());
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_load_library_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[library]\npath = \"/usr/lib/libnvidia-ml.so.1\"").unwrap();
        let loaded = ConfigFile::load(file.path()).unwrap();
        assert_eq!(
            loaded.library.path.as_deref(),
            Some("/usr/lib/libnvidia-ml.so.1")
        );
    }
}
