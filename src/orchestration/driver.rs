//! Run driver
//!
//! Executes the configured invocations strictly in order against one build
//! home. The first non-zero exit aborts: a partially resolved closure would
//! otherwise turn into a silently incomplete lockfile.

use crate::config::{ArtifactFetch, RunConfig};
use crate::error::{RunKind, SquishError, SquishResult};
use crate::orchestration::build_error_output;
use crate::orchestration::home::BuildHome;
use crate::orchestration::runner::{Invocation, ProcessOutput, ProcessRunner};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Marker sbt's launcher puts on its own diagnostics
const LAUNCHER_MARKER: &str = "[launcher]";

/// Drives sbt (and Coursier) invocations for one project
pub struct RunDriver {
    runner: Arc<dyn ProcessRunner>,
    project_dir: PathBuf,
    sbt: String,
    coursier: String,
}

impl RunDriver {
    /// Create a driver for `project_dir` using `sbt` and `cs` from `PATH`
    pub fn new(runner: Arc<dyn ProcessRunner>, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            project_dir: project_dir.into(),
            sbt: "sbt".to_string(),
            coursier: "cs".to_string(),
        }
    }

    /// Override the sbt launcher
    pub fn with_sbt(mut self, sbt: impl Into<String>) -> Self {
        self.sbt = sbt.into();
        self
    }

    /// Override the Coursier CLI
    pub fn with_coursier(mut self, coursier: impl Into<String>) -> Self {
        self.coursier = coursier.into();
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Run the shell commands, then every sbt run, in order
    ///
    /// On success the home's cache holds the union of everything the runs
    /// resolved. Only exit status is interpreted; output is logged, never
    /// parsed.
    pub async fn execute(
        &self,
        config: &RunConfig,
        home: &BuildHome,
        network_allowed: bool,
    ) -> SquishResult<()> {
        let env = home.env(network_allowed);

        let total = config.shell_commands.len();
        for (i, command) in config.shell_commands.iter().enumerate() {
            let expanded: Vec<String> = command.iter().map(|arg| home.expand(arg)).collect();
            let (program, args) = expanded
                .split_first()
                .ok_or_else(|| SquishError::Internal(format!("shell command {} is empty", i + 1)))?;

            let invocation = Invocation::new(program.as_str(), &self.project_dir)
                .args(args.iter().cloned())
                .envs(&env);
            info!(
                "Running shell command ({}/{}): {}",
                i + 1,
                total,
                invocation.command_line()
            );
            self.run_step(RunKind::Shell, i + 1, &invocation).await?;
        }

        let total = config.sbt_runs.len();
        for (i, run) in config.sbt_runs.iter().enumerate() {
            let invocation = Invocation::new(self.sbt.as_str(), &self.project_dir)
                .arg("--batch")
                .args(run.args.iter().cloned())
                .envs(&env);
            info!("Running sbt ({}/{}): {}", i + 1, total, invocation.command_line());

            let output = self.run_step(RunKind::Sbt, i + 1, &invocation).await?;
            for line in output.stderr.lines().filter(|l| l.contains(LAUNCHER_MARKER)) {
                info!("{}", line.trim());
            }
        }

        Ok(())
    }

    /// Fetch main artifacts and sources of sbt compiler bridges
    ///
    /// sbt compiles the bridge from a sources jar it never caches, so an
    /// offline build would fail without this.
    pub async fn fetch_compiler_bridges(
        &self,
        bridges: &[(String, String)],
        home: &BuildHome,
    ) -> SquishResult<()> {
        if bridges.is_empty() {
            return Ok(());
        }
        info!("Fetching {} compiler-bridge source set(s)", bridges.len());

        let env = home.env(true);
        let mut index = 0;
        for (scala_version, bridge_version) in bridges {
            let coord = format!(
                "org.scala-sbt:compiler-bridge_{}:{}",
                scala_version, bridge_version
            );
            info!("Fetching sources and dependencies for {}", coord);

            for extra in [None, Some("--sources")] {
                index += 1;
                let invocation = Invocation::new(self.coursier.as_str(), &self.project_dir)
                    .arg("fetch")
                    .args(extra)
                    .arg(coord.as_str())
                    .envs(&env);
                let output = self.run_step(RunKind::Coursier, index, &invocation).await?;
                log_fetched(&output);
            }
        }

        Ok(())
    }

    /// Fetch explicitly configured coordinates and their classifiers
    pub async fn fetch_artifacts(
        &self,
        fetches: &[ArtifactFetch],
        home: &BuildHome,
    ) -> SquishResult<()> {
        if fetches.is_empty() {
            return Ok(());
        }
        info!("Fetching {} configured artifact(s)", fetches.len());

        let env = home.env(true);
        let mut index = 0;
        for fetch in fetches {
            let classifier_args = fetch
                .classifiers
                .iter()
                .map(|c| Some(format!("--classifier={}", c)));

            for extra in std::iter::once(None).chain(classifier_args) {
                index += 1;
                let invocation = Invocation::new(self.coursier.as_str(), &self.project_dir)
                    .arg("fetch")
                    .args(extra)
                    .arg(fetch.coord.as_str())
                    .envs(&env);
                info!("Fetching {}", invocation.command_line());
                let output = self.run_step(RunKind::Coursier, index, &invocation).await?;
                log_fetched(&output);
            }
        }

        Ok(())
    }

    /// Run one invocation, turning a non-zero exit into `RunFailure`
    async fn run_step(
        &self,
        kind: RunKind,
        index: usize,
        invocation: &Invocation,
    ) -> SquishResult<ProcessOutput> {
        let output = self.runner.run(invocation).await?;
        if output.success() {
            return Ok(output);
        }

        Err(SquishError::RunFailure {
            kind,
            index,
            command: invocation.command_line(),
            status: output.status_label(),
            output: build_error_output(&output.stdout, &output.stderr),
        })
    }
}

fn log_fetched(output: &ProcessOutput) {
    for line in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
        debug!("  {}", line);
    }
}
