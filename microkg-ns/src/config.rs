//! Run configuration for microkg-ns
//!
//! Command-line values win over the TOML bootstrap file, which wins over the
//! built-in defaults. The resolved [`RunConfig`] is handed to each component;
//! nothing reads configuration from process-wide state afterwards.

use microkg_common::config::{AugmentationConfig, TomlConfig};
use microkg_common::{Error, Result};
use std::path::PathBuf;
use tracing::info;

/// Settings shared by every subcommand
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Node synonymizer SQLite database
    pub synonym_db: PathBuf,
    pub augmentation: AugmentationConfig,
}

/// Command-line values that override the TOML file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub synonym_db: Option<PathBuf>,
    pub no_augment: bool,
    pub augment_url: Option<String>,
}

/// Apply `--no-augment` / `--augment-url` to the TOML augmentation section
///
/// Used on its own by `prepare`, which never opens the synonym database.
pub fn resolve_augmentation(
    overrides: &ConfigOverrides,
    mut augmentation: AugmentationConfig,
) -> AugmentationConfig {
    if overrides.no_augment {
        augmentation.enabled = false;
    }
    if let Some(url) = &overrides.augment_url {
        augmentation.base_url = url.clone();
    }
    augmentation
}

impl RunConfig {
    /// Merge command-line overrides into the bootstrap configuration
    pub fn resolve(overrides: ConfigOverrides, toml_config: TomlConfig) -> Result<Self> {
        let augmentation = resolve_augmentation(&overrides, toml_config.augmentation);

        let synonym_db = match (overrides.synonym_db, toml_config.synonym_db) {
            (Some(path), _) => {
                info!("Synonym database: {} (from command line)", path.display());
                path
            }
            (None, Some(path)) => {
                info!("Synonym database: {} (from TOML config)", path.display());
                path
            }
            (None, None) => {
                return Err(Error::Config(
                    "Synonym database not configured. Use --syn-db, MICROKG_SYN_DB, \
                     or `synonym_db = \"...\"` in microkg.toml"
                        .to_string(),
                ))
            }
        };

        Ok(Self {
            synonym_db,
            augmentation,
        })
    }
}
