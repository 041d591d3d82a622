//! Configuration management for squish
//!
//! Two kinds of configuration exist: tool settings (TOML, optional, see
//! [`schema`]) and the per-project run configuration that drives
//! generation (JSON, see [`run`]).

pub mod run;
pub mod schema;

pub use run::{ArtifactFetch, RunConfig, RunSpec};
pub use schema::Config;

use crate::error::{SquishError, SquishResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Settings manager
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
            .join("squish")
            .join("config.toml")
    }

    /// Load settings, using defaults if the file does not exist
    pub async fn load(&self) -> SquishResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load settings from a specific file
    pub async fn load_from_file(&self, path: &Path) -> SquishResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| SquishError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| SquishError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save settings to file
    pub async fn save(&self, config: &Config) -> SquishResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            SquishError::io(format!("writing config to {}", self.config_path.display()), e)
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    async fn ensure_config_dir(&self) -> SquishResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SquishError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
