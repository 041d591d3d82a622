//! Settings schema for squish
//!
//! Settings are stored at `~/.config/squish/config.toml`. Every section and
//! field is optional; missing values fall back to the defaults below.

use serde::{Deserialize, Serialize};

/// Root settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Lockfile generation settings
    pub generate: GenerateConfig,

    /// Cache reconstruction settings
    pub reconstruct: ReconstructConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Lockfile generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// sbt launcher to invoke
    pub sbt: String,

    /// Coursier CLI used for supplementary fetches
    pub coursier: String,

    /// Keep the isolated home after generation
    pub keep_temp: bool,

    /// Remove stale `target` and `project/target` output before the first run
    pub clean_targets: bool,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            sbt: "sbt".to_string(),
            coursier: "cs".to_string(),
            keep_temp: false,
            clean_targets: true,
        }
    }
}

/// Cache reconstruction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructConfig {
    /// Maximum concurrent downloads
    pub jobs: usize,

    /// Extra attempts after a transient fetch failure
    pub retries: u32,

    /// Initial retry delay in milliseconds (doubles per attempt)
    pub backoff_ms: u64,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self {
            jobs: 8,
            retries: 3,
            backoff_ms: 500,
            timeout_secs: 300,
        }
    }
}
