//! CLI configuration and settings management

use crate::{CliError, Result};
use spv_pipeline::ToolchainConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-directory configuration file
pub const LOCAL_CONFIG_FILE: &str = "spvc.toml";

/// Toolchain configuration plus the file it came from
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub toolchain: ToolchainConfig,
    /// `None` when running on built-in defaults
    pub source: Option<PathBuf>,
}

impl CliConfig {
    /// Load configuration from `config_path`, or from the standard locations,
    /// falling back to defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => Self::discover(Path::new("."), dirs::config_dir().as_deref()),
        }
    }

    /// Try `<dir>/spvc.toml`, then `<config_dir>/spvc/config.toml`
    pub fn discover(dir: &Path, config_dir: Option<&Path>) -> Result<Self> {
        let candidates = std::iter::once(dir.join(LOCAL_CONFIG_FILE))
            .chain(config_dir.map(|d| d.join("spvc").join("config.toml")));

        for candidate in candidates {
            if candidate.is_file() {
                return Self::load_from_file(&candidate);
            }
            debug!("No configuration at {}", candidate.display());
        }
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let toolchain = ToolchainConfig::load_from_file(path)
            .map_err(|e| CliError::Config(e.to_string()))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(Self {
            toolchain,
            source: Some(path.to_path_buf()),
        })
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("spvc").join("config.toml"))
    }
}
