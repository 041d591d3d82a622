//! Lockfile generation pipeline
//!
//! Runs the configured builds against an isolated home, completes the cache
//! with what sbt needs but never caches itself, then pins every cached
//! artifact.

use crate::cache::scan::{check_legacy_ivy_cache, CacheScanner};
use crate::config::RunConfig;
use crate::error::{SquishError, SquishResult};
use crate::lockfile::Lockfile;
use crate::orchestration::{BuildHome, RunDriver};
use std::path::Path;
use tracing::{debug, info};

/// Build output directories removed before generation
///
/// Stale output lets sbt skip work: an up-to-date `target` means zinc never
/// resolves the compiler bridge, and stale metabuild output skips plugin
/// resolution. Either leaves artifacts out of the cache.
const STALE_TARGETS: &[&str] = &["target", "project/target", "project/project/target"];

/// Generation knobs
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Keep the temporary home after generation
    pub keep_temp: bool,
    /// Remove stale build output before running sbt
    pub clean_targets: bool,
    /// Let sbt and Coursier reach remote repositories
    pub network_allowed: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            keep_temp: false,
            clean_targets: true,
            network_allowed: true,
        }
    }
}

/// Produces a lockfile from a run configuration
pub struct Generator {
    driver: RunDriver,
    options: GenerateOptions,
}

impl Generator {
    pub fn new(driver: RunDriver) -> Self {
        Self {
            driver,
            options: GenerateOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    /// Generate against a fresh temporary home
    pub async fn generate(&self, config: &RunConfig) -> SquishResult<Lockfile> {
        let home = BuildHome::create_temp(self.options.keep_temp)?;
        if self.options.keep_temp {
            info!("Keeping build home at {}", home.root().display());
        } else {
            debug!("Using temporary build home {}", home.root().display());
        }

        self.generate_in(config, &home).await
    }

    /// Generate against an existing home
    pub async fn generate_in(&self, config: &RunConfig, home: &BuildHome) -> SquishResult<Lockfile> {
        if self.options.clean_targets {
            clean_stale_targets(self.driver.project_dir()).await?;
        }

        self.driver
            .execute(config, home, self.options.network_allowed)
            .await?;

        let scanner = CacheScanner::new(home.coursier_cache());
        let bridges = scanner.compiler_bridges()?;
        self.driver.fetch_compiler_bridges(&bridges, home).await?;
        self.driver
            .fetch_artifacts(&config.fetch_artifacts, home)
            .await?;

        check_legacy_ivy_cache(&home.ivy_cache())?;

        info!("Scanning {}", home.coursier_cache().display());
        let entries = tokio::task::spawn_blocking(move || scanner.collect())
            .await
            .map_err(|e| SquishError::Internal(format!("cache scan task failed: {}", e)))??;

        let lockfile = Lockfile::from_entries(entries)?;
        info!("Locked {} artifacts", lockfile.len());
        Ok(lockfile)
    }
}

async fn clean_stale_targets(project_dir: &Path) -> SquishResult<()> {
    for target in STALE_TARGETS {
        let dir = project_dir.join(target);
        if !dir.exists() {
            continue;
        }
        debug!("Removing {}", dir.display());
        tokio::fs::remove_dir_all(&dir)
            .await
            .map_err(|e| SquishError::io(format!("removing {}", dir.display()), e))?;
    }
    Ok(())
}
