//! Bootstrap configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments (handled by the binary)
//! 2. TOML config file (explicit path, `MICROKG_CONFIG`, or the platform config dir)
//! 3. Built-in defaults
//!
//! A missing *default* config file is not an error: the caller gets the
//! built-in defaults and a warning. A file that was named explicitly must exist
//! and parse.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MICROKG_CONFIG";

/// NCBI E-utilities esummary endpoint
pub const DEFAULT_ESUMMARY_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Path to the node synonymizer SQLite database
    #[serde(default)]
    pub synonym_db: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Gene description augmentation (optional)
    #[serde(default)]
    pub augmentation: AugmentationConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Settings for the gene description service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AugmentationConfig {
    /// Query the description service at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// esummary endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Minimum delay between two requests
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            base_url: default_base_url(),
            min_interval_ms: default_min_interval_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_base_url() -> String {
    DEFAULT_ESUMMARY_URL.to_string()
}

fn default_min_interval_ms() -> u64 {
    500
}

fn default_timeout_secs() -> u64 {
    30
}

/// Default config file location for the platform (`<config_dir>/microkg/microkg.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("microkg").join("microkg.toml"))
}

/// Parse a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the bootstrap configuration
///
/// `explicit` (from `--config`) takes priority over `MICROKG_CONFIG`, which
/// takes priority over the platform default location.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        let config = read_toml_config(path)?;
        info!("Loaded configuration from {}", path.display());
        return Ok(config);
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        let config = read_toml_config(&path)?;
        info!("Loaded configuration from {} ({})", path.display(), CONFIG_ENV_VAR);
        return Ok(config);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            let config = read_toml_config(&path)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        Some(path) => {
            warn!("No config file at {}, using built-in defaults", path.display());
            Ok(TomlConfig::default())
        }
        None => {
            warn!("Could not determine config directory, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert!(config.synonym_db.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(config.augmentation.enabled);
        assert_eq!(config.augmentation.min_interval_ms, 500);
        assert_eq!(config.augmentation.base_url, DEFAULT_ESUMMARY_URL);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [augmentation]
            min_interval_ms = 1000
            "#,
        )
        .unwrap();
        assert_eq!(config.augmentation.min_interval_ms, 1000);
        assert_eq!(config.augmentation.timeout_secs, 30);
        assert!(config.augmentation.enabled);
        assert_eq!(config.logging.level, "info");
    }
}
