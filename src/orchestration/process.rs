//! Process runner backed by `tokio::process`

use crate::error::{SquishError, SquishResult};
use crate::orchestration::runner::{Invocation, ProcessOutput, ProcessRunner};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Runs commands as child processes, capturing stdout and stderr
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TokioProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, invocation: &Invocation) -> SquishResult<ProcessOutput> {
        debug!(
            "Executing in {}: {}",
            invocation.cwd.display(),
            invocation.command_line()
        );

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| SquishError::command_failed(invocation.command_line(), e))?;

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str, cwd: &std::path::Path) -> Invocation {
        Invocation::new("sh", cwd).arg("-c").arg(script)
    }

    #[tokio::test]
    async fn captures_output_and_exit_code() {
        let dir = TempDir::new().unwrap();
        let output = TokioProcessRunner::new()
            .run(&sh("echo out; echo err >&2; exit 3", dir.path()))
            .await
            .unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[tokio::test]
    async fn applies_env_and_cwd() {
        let dir = TempDir::new().unwrap();
        let inv = sh("printf '%s' \"$SQUISH_TEST_VAR\"; pwd > where", dir.path())
            .envs(&[("SQUISH_TEST_VAR".to_string(), "hello".to_string())]);

        let output = TokioProcessRunner::new().run(&inv).await.unwrap();

        assert!(output.success());
        assert_eq!(output.stdout, "hello");
        assert!(dir.path().join("where").exists());
    }

    #[tokio::test]
    async fn missing_program_is_command_failed() {
        let dir = TempDir::new().unwrap();
        let inv = Invocation::new("squish-definitely-not-installed", dir.path());

        let err = TokioProcessRunner::new().run(&inv).await.unwrap_err();
        assert!(matches!(err, SquishError::CommandFailed { .. }));
    }
}
