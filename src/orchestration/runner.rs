//! Process execution abstraction
//!
//! The driver only needs "run this command to completion and tell me how it
//! exited". Keeping that behind a trait lets tests substitute a recording
//! runner that never spawns anything.

use crate::error::SquishResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A fully specified external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to execute (looked up on `PATH` if not absolute)
    pub program: String,
    /// Arguments after the program
    pub args: Vec<String>,
    /// Working directory
    pub cwd: PathBuf,
    /// Environment overrides on top of the inherited environment
    pub env: Vec<(String, String)>,
}

impl Invocation {
    /// Start an invocation of `program` in `cwd`
    pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, env: &[(String, String)]) -> Self {
        self.env.extend(env.iter().cloned());
        self
    }

    /// Look up an environment override
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Space-joined command line for logs and diagnostics
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a completed process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` if terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Output of a process that exited with `code`
    pub fn exited(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Default::default()
        }
    }

    /// Whether the process exited with code 0
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// "exit code N" or "terminated by signal"
    pub fn status_label(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Executes one external command to completion
///
/// Implementations must not treat a non-zero exit as an error; only a
/// failure to start the process is.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run the invocation and capture its output
    async fn run(&self, invocation: &Invocation) -> SquishResult<ProcessOutput>;
}
