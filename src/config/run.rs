//! Run configuration for lockfile generation
//!
//! ```json
//! {
//!   "sbt_runs": [{ "args": ["reload plugins", "update"] }, { "args": ["compile"] }],
//!   "shell_commands": [["./gen-sources.sh", "$HOME/out"]],
//!   "fetch_artifacts": [{ "coord": "org.scala-lang:scala3-library_3:3.3.1", "classifiers": ["sources"] }]
//! }
//! ```
//!
//! Runs are executed in order; later runs may depend on state left in the
//! cache by earlier ones.

use crate::error::{SquishError, SquishResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One sbt invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSpec {
    /// Arguments passed after `sbt --batch`
    pub args: Vec<String>,
}

/// An extra Coursier coordinate to fetch after the sbt runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactFetch {
    /// `group:artifact:version`
    pub coord: String,

    /// Extra classifiers, e.g. `sources`
    #[serde(default)]
    pub classifiers: Vec<String>,
}

/// Ordered list of invocations that together resolve the dependency closure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub sbt_runs: Vec<RunSpec>,

    /// Commands run before sbt, e.g. code generators
    #[serde(default)]
    pub shell_commands: Vec<Vec<String>>,

    #[serde(default)]
    pub fetch_artifacts: Vec<ArtifactFetch>,
}

impl RunConfig {
    /// Load and validate a run configuration file
    pub fn load(path: &Path) -> SquishResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SquishError::io(format!("reading run config {}", path.display()), e))?;
        Self::parse(&content).map_err(|reason| SquishError::RunConfigInvalid {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse and validate from a JSON string
    pub fn parse(content: &str) -> Result<Self, String> {
        let config: Self = serde_json::from_str(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.sbt_runs.is_empty() {
            return Err("'sbt_runs' must contain at least one run".to_string());
        }
        for (i, run) in self.sbt_runs.iter().enumerate() {
            if run.args.is_empty() {
                return Err(format!("sbt_runs[{}].args must not be empty", i));
            }
        }
        for (i, cmd) in self.shell_commands.iter().enumerate() {
            if cmd.is_empty() {
                return Err(format!("shell_commands[{}] must not be empty", i));
            }
        }
        for (i, fetch) in self.fetch_artifacts.iter().enumerate() {
            if fetch.coord.trim().is_empty() {
                return Err(format!("fetch_artifacts[{}].coord must not be empty", i));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_minimal_config() {
        let config =
            RunConfig::parse(r#"{"sbt_runs":[{"args":["resolvePlugins"]},{"args":["compile"]}]}"#)
                .unwrap();
        assert_eq!(config.sbt_runs.len(), 2);
        assert_eq!(config.sbt_runs[1].args, vec!["compile"]);
        assert!(config.shell_commands.is_empty());
        assert!(config.fetch_artifacts.is_empty());
    }

    #[test]
    fn parses_full_config() {
        let config = RunConfig::parse(
            r#"{
                "sbt_runs": [{"args": ["update"]}],
                "shell_commands": [["make", "gen"]],
                "fetch_artifacts": [{"coord": "org.typelevel:cats-core_3:2.10.0", "classifiers": ["sources"]}, {"coord": "a:b:1"}]
            }"#,
        )
        .unwrap();
        assert_eq!(config.shell_commands, vec![vec!["make", "gen"]]);
        assert_eq!(config.fetch_artifacts[0].classifiers, vec!["sources"]);
        assert!(config.fetch_artifacts[1].classifiers.is_empty());
    }

    #[test]
    fn rejects_missing_or_empty_runs() {
        assert!(RunConfig::parse(r#"{}"#).is_err());
        assert!(RunConfig::parse(r#"{"sbt_runs": []}"#)
            .unwrap_err()
            .contains("at least one"));
        assert!(RunConfig::parse(r#"{"sbt_runs": [{"args": []}]}"#)
            .unwrap_err()
            .contains("sbt_runs[0]"));
    }

    #[test]
    fn rejects_wrong_types_and_unknown_fields() {
        assert!(RunConfig::parse(r#"{"sbt_runs": {"args": ["x"]}}"#).is_err());
        assert!(RunConfig::parse(r#"{"sbt_runs": [{"args": "compile"}]}"#).is_err());
        assert!(RunConfig::parse(r#"{"sbt_runs": [{"args": ["x"]}], "sbt_run": []}"#).is_err());
        assert!(RunConfig::parse(r#"{"sbt_runs": [{"args": ["x"]}], "fetch_artifacts": [{"coord": ""}]}"#).is_err());
    }

    #[test]
    fn load_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lock-config.json");
        std::fs::write(&path, r#"{"sbt_runs": []}"#).unwrap();

        match RunConfig::load(&path).unwrap_err() {
            SquishError::RunConfigInvalid { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected RunConfigInvalid, got {other:?}"),
        }
    }
}
