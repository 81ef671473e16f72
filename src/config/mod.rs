//! Configuration management for cup-fly

pub mod schema;

pub use schema::{ClientConfig, Config, Credentials, DeploymentConfig};

use crate::error::{CupError, CupResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("concourse-up")
            .join("fly.toml")
    }

    /// Load configuration; the file must exist
    pub async fn load(&self) -> CupResult<Config> {
        if !self.config_path.exists() {
            return Err(CupError::ConfigNotFound(self.config_path.clone()));
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> CupResult<Config> {
        debug!("Loading config from {}", path.display());

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| CupError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| CupError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Read the versions document named by `client.versions`
    pub async fn load_versions(config: &Config) -> CupResult<Vec<u8>> {
        let path = config
            .client
            .versions
            .as_ref()
            .ok_or(CupError::MissingSetting("client.versions"))?;

        fs::read(path)
            .await
            .map_err(|e| CupError::io(format!("reading versions from {}", path.display()), e))
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
