//! Error types for squish
//!
//! All modules use `SquishResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for squish operations
pub type SquishResult<T> = Result<T, SquishError>;

/// All errors that can occur in squish
#[derive(Error, Debug)]
pub enum SquishError {
    // Generation errors
    #[error("{kind} run {index} failed ({status}): {command}\n{output}")]
    RunFailure {
        kind: RunKind,
        index: usize,
        command: String,
        status: String,
        output: String,
    },

    #[error("Cannot scan cache entry {path}: {reason}")]
    ScanError { path: PathBuf, reason: String },

    #[error("No artifacts found in cache {0}")]
    NoArtifacts(PathBuf),

    #[error("Found {count} Ivy artifacts, but sbt should resolve through Coursier only. First artifact: {first}")]
    LegacyIvyArtifacts { count: usize, first: PathBuf },

    #[error("Inconsistent hashes for {url}: {first} vs {second}")]
    InconsistentEntry {
        url: String,
        first: String,
        second: String,
    },

    #[error("Unsupported URL {url}: {reason}")]
    UnsupportedUrl { url: String, reason: String },

    // Reconstruction errors
    #[error("Failed to fetch {url} after {attempts} attempt(s): {reason}")]
    FetchError {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("Integrity check failed for {url}: expected sha256 {expected}, got {actual}")]
    IntegrityError {
        url: String,
        expected: String,
        actual: String,
    },

    // Lockfile errors
    #[error("Unsupported lockfile version {found} (expected {expected})")]
    UnsupportedLockfileVersion { found: u64, expected: u32 },

    #[error("Invalid lockfile: {0}")]
    LockfileInvalid(String),

    // Configuration errors
    #[error("Invalid run configuration at {path}: {reason}")]
    RunConfigInvalid { path: PathBuf, reason: String },

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Which kind of external invocation a `RunFailure` refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// A pre-build shell command
    Shell,
    /// An sbt invocation from `sbt_runs`
    Sbt,
    /// A supplementary Coursier fetch
    Coursier,
}

impl std::fmt::Display for RunKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Shell => "shell",
            Self::Sbt => "sbt",
            Self::Coursier => "coursier",
        };
        write!(f, "{}", name)
    }
}

impl SquishError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a scan error for a path
    pub fn scan(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ScanError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported URL error
    pub fn unsupported_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::RunFailure { kind: RunKind::Sbt, .. } => {
                Some("Re-run with --keep-temp to inspect the isolated sbt home")
            }
            Self::NoArtifacts(_) => {
                Some("sbt may have failed to download dependencies; check the sbt_runs arguments")
            }
            Self::InconsistentEntry { .. } => {
                Some("The remote artifact changed between downloads; the build is not reproducible")
            }
            Self::IntegrityError { .. } => {
                Some("Regenerate the lockfile if the upstream artifact legitimately changed")
            }
            Self::FetchError { .. } => Some("Re-run reconstruct; artifacts already placed are reused"),
            Self::UnsupportedLockfileVersion { .. } => {
                Some("Regenerate the lockfile with this version of squish")
            }
            _ => None,
        }
    }
}
